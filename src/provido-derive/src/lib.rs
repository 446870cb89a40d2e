mod attrs;
mod impls;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::Result as SynResult;

/// Turns a factory function into a function returning a process-wide
/// provider handle.
///
/// The annotated function takes the container and returns either the object
/// or a `Result` of it:
///
/// ```rust,ignore
/// #[provider]
/// fn config(_: &Container) -> Result<Config, ConfigError> { ... }
///
/// #[provider]
/// fn client(container: &Container) -> Client { ... }
/// ```
///
/// After expansion `config()` returns `&'static Handle<Config>`, and every
/// call returns the same handle, so objects are memoized per container as
/// usual. `#[provider(crate = path)]` changes the path to the runtime crate.
#[proc_macro_attribute]
pub fn provider(attr: TokenStream, item: TokenStream) -> TokenStream {
    match provider_impl(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn provider_impl(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream2> {
    let attr_data = attrs::parse_attributes(attr)?;
    let expanded = impls::expand_provider(item, attr_data)?;
    Ok(expanded)
}
