use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{
    Error as SynError, FnArg, GenericArgument, ItemFn, PathArguments, Result as SynResult,
    ReturnType, Signature, Type,
};

use crate::attrs::AttributeData;

#[derive(Debug)]
enum ReturnTypeData {
    Infallible { output: Type },
    Result { output: Type },
}

impl ReturnTypeData {
    fn output(&self) -> &Type {
        match self {
            Self::Infallible { output } | Self::Result { output } => output,
        }
    }
}

pub fn expand_provider(item: TokenStream, attr_data: AttributeData) -> SynResult<TokenStream2> {
    let item_fn = match syn::parse::<ItemFn>(item) {
        Ok(item_fn) => item_fn,
        Err(err) => {
            return Err(SynError::new(
                err.span(),
                "`#[provider]` should be annotated on a free function",
            ))
        }
    };

    check_signature(&item_fn.sig)?;
    let return_type = parse_return_type(&item_fn.sig.output)?;

    Ok(expand_provider_function(item_fn, return_type, attr_data))
}

fn check_signature(signature: &Signature) -> SynResult<()> {
    if let Some(asyncness) = &signature.asyncness {
        return Err(SynError::new_spanned(
            asyncness,
            "a provider function should not be `async`",
        ));
    }
    if !signature.generics.params.is_empty() || signature.generics.where_clause.is_some() {
        return Err(SynError::new_spanned(
            &signature.generics,
            "a provider function should not be generic",
        ));
    }
    if let Some(FnArg::Receiver(rec)) = signature.inputs.first() {
        return Err(SynError::new_spanned(
            rec,
            "method is not allowed to be annotated with `#[provider]`",
        ));
    }
    if signature.inputs.len() != 1 {
        return Err(SynError::new_spanned(
            &signature.inputs,
            "a provider function should take exactly one `&Container` argument",
        ));
    }
    Ok(())
}

fn parse_return_type(output: &ReturnType) -> SynResult<ReturnTypeData> {
    let ReturnType::Type(_, return_type) = output else {
        return Err(SynError::new(
            output.span(),
            "a provider function's return type should be `T` or `Result<T, E>`",
        ));
    };

    match return_type.as_ref() {
        Type::Path(path) if path.qself.is_none() => {
            let Some(last) = path.path.segments.last() else {
                return Err(SynError::new(path.span(), "invalid return type"));
            };
            if last.ident != "Result" {
                return Ok(ReturnTypeData::Infallible {
                    output: (**return_type).clone(),
                });
            }

            let PathArguments::AngleBracketed(args) = &last.arguments else {
                return Err(SynError::new(
                    last.span(),
                    "a provider function's return type should be `T` or `Result<T, E>`",
                ));
            };
            match args.args.first() {
                Some(GenericArgument::Type(output)) => Ok(ReturnTypeData::Result {
                    output: output.clone(),
                }),
                _ => Err(SynError::new(
                    args.span(),
                    "a provider function's return type should be `T` or `Result<T, E>`",
                )),
            }
        }
        Type::ImplTrait(ty) => Err(SynError::new(
            ty.span(),
            "a provider function should return a concrete type",
        )),
        _ => Ok(ReturnTypeData::Infallible {
            output: (**return_type).clone(),
        }),
    }
}

fn expand_provider_function(
    item_fn: ItemFn,
    return_type: ReturnTypeData,
    attr_data: AttributeData,
) -> TokenStream2 {
    let krate = &attr_data.krate;
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item_fn;

    let name = &sig.ident;
    let factory = format_ident!("__{}_factory", name);
    let inputs = &sig.inputs;
    let ret = &sig.output;
    let output = return_type.output();

    let make_handle = match &return_type {
        ReturnTypeData::Result { .. } => quote! {
            #krate::provider::Handle::from_fn(#factory)
        },
        ReturnTypeData::Infallible { .. } => quote! {
            #krate::provider::Handle::from_fn(
                |container: &#krate::container::Container| {
                    ::std::result::Result::Ok::<_, ::std::convert::Infallible>(#factory(container))
                }
            )
        },
    };

    quote! {
        #(#attrs)*
        #vis fn #name() -> &'static #krate::provider::Handle<#output> {
            static HANDLE: ::std::sync::OnceLock<#krate::provider::Handle<#output>> =
                ::std::sync::OnceLock::new();

            fn #factory(#inputs) #ret #block

            HANDLE.get_or_init(|| #make_handle)
        }
    }
}
