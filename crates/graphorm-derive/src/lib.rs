//! Derive macro for `graphorm::Record`.
//!
//! ```rust,ignore
//! #[derive(Debug, Default, Record)]
//! struct Product {
//!     #[graph("name:sku;primary;label:Product")]
//!     sku: String,
//!     #[graph("name:product_name")]
//!     name: String,
//!     #[graph]
//!     price: f64,
//!     // Not mapped: no #[graph] attribute.
//!     scratch: Vec<u8>,
//! }
//! ```

use proc_macro::TokenStream;

mod record;

#[proc_macro_derive(Record, attributes(graph))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
