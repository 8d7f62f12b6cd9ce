use proc_macro::TokenStream;
use quote::{format_ident, quote};

use syn::spanned::Spanned as _;
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, FnArg, GenericArgument, ImplItem, ImplItemFn,
    ItemImpl, LitStr, Pat, PathArguments, ReturnType, Type,
};

const CONSTRUCTOR_ATTR: &str = "constructor";
const METHOD_ATTR: &str = "method";
const PROPERTY_ATTR: &str = "property";
const DERIVE_ATTR: &str = "wiring";

fn compile_error(error: Error) -> TokenStream {
    TokenStream::from(error.to_compile_error())
}

fn is_result_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Result"
        && let PathArguments::AngleBracketed(_) = &segment.arguments
    {
        return true;
    }
    false
}

/// Returns true for `Self`, the impl type itself, or a `Result` of either.
fn is_instance_type(ty: &Type, self_ident: Option<&str>) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    let Some(segment) = type_path.path.segments.last() else {
        return false;
    };
    if segment.ident == "Result" {
        if let PathArguments::AngleBracketed(generics) = &segment.arguments
            && let Some(GenericArgument::Type(inner)) = generics.args.first()
        {
            return is_instance_type(inner, self_ident);
        }
        return false;
    }
    type_path.qself.is_none()
        && type_path.path.segments.len() == 1
        && segment.arguments.is_empty()
        && (segment.ident == "Self" || self_ident.is_some_and(|name| segment.ident == name))
}

fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return Some(segment.ident.to_string());
    }
    None
}

/// Parses an optional string literal out of `#[attr]` or `#[attr("name")]`.
fn attr_name(attr: &Attribute) -> syn::Result<Option<String>> {
    match &attr.meta {
        syn::Meta::Path(_) => Ok(None),
        syn::Meta::List(list) => Ok(Some(syn::parse2::<LitStr>(list.tokens.clone())?.value())),
        syn::Meta::NameValue(_) => Err(Error::new(
            attr.span(),
            "Expected #[attr] or #[attr(\"name\")]",
        )),
    }
}

/// Attribute macro for impl blocks declaring a registered type.
///
/// Functions marked `#[constructor]`, `#[method]` or `#[property("name")]` are
/// registered with the type registry. The type is registered under the name of
/// the impl type unless a name is given: `#[register("Name")]`.
///
/// Method results convert with `Value::from`. A method returning `Self`, the
/// impl type or a `Result` of either gives a shared object instead.
#[proc_macro_attribute]
pub fn register(attr: TokenStream, item: TokenStream) -> TokenStream {
    let name = if attr.is_empty() {
        None
    } else {
        Some(syn::parse_macro_input!(attr as LitStr).value())
    };
    if let Ok(item_impl) = syn::parse::<ItemImpl>(item) {
        return handle_register_impl(item_impl, name);
    }
    compile_error(Error::new(
        proc_macro2::Span::call_site(),
        "#[register] can only be applied to impl blocks",
    ))
}

/// Derive macro for the Register trait.
///
/// Every field becomes a constructor argument in declaration order, except
/// fields marked `#[wiring(skip)]`, which start from `Default::default()`.
/// Fields marked `#[wiring(property)]` can also be assigned as properties.
#[proc_macro_derive(Register, attributes(wiring))]
pub fn derive_register(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    handle_derive_register(input)
}

#[derive(Default)]
struct FieldOptions {
    skip: bool,
    property: bool,
}

fn field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs {
        if !attr.path().is_ident(DERIVE_ATTR) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("property") {
                options.property = true;
                Ok(())
            } else {
                Err(meta.error("Expected `skip` or `property`"))
            }
        })?;
    }
    Ok(options)
}

fn type_options(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs {
        if !attr.path().is_ident(DERIVE_ATTR) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("Expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}

fn handle_derive_register(input: DeriveInput) -> TokenStream {
    let ident = &input.ident;
    let fields = match &input.data {
        Data::Struct(s) => &s.fields,
        _ => {
            return compile_error(Error::new(ident.span(), "Only structs are supported"));
        }
    };
    let name = match type_options(&input.attrs) {
        Ok(v) => v.unwrap_or_else(|| ident.to_string()),
        Err(err) => return compile_error(err),
    };

    let mut field_lets = Vec::new();
    let mut field_inits = Vec::new();
    let mut properties = Vec::new();

    let construct = match fields {
        Fields::Named(fields) => {
            for field in &fields.named {
                let Some(field_ident) = field.ident.as_ref() else {
                    continue;
                };
                let field_ty = &field.ty;
                let options = match field_options(&field.attrs) {
                    Ok(v) => v,
                    Err(err) => return compile_error(err),
                };
                if options.skip {
                    field_inits.push(quote! {
                        #field_ident: ::std::default::Default::default()
                    });
                } else {
                    field_lets.push(quote! {
                        let #field_ident = args.arg::<#field_ty>()?;
                    });
                    field_inits.push(quote! { #field_ident });
                }
                if options.property {
                    let property_name = field_ident.to_string();
                    properties.push(quote! {
                        .property(#property_name, |this: &mut Self, value: ::wiring::Value| {
                            this.#field_ident =
                                <#field_ty as ::wiring::FromValue>::from_value(value)?;
                            Ok(())
                        })
                    });
                }
            }
            quote! { Self { #(#field_inits,)* } }
        }
        Fields::Unnamed(_) => {
            return compile_error(Error::new(
                ident.span(),
                "Tuple structs are not supported",
            ));
        }
        Fields::Unit => quote! { Self },
    };

    let args_pat = if field_lets.is_empty() {
        quote! { args }
    } else {
        quote! { mut args }
    };

    quote! {
        impl ::wiring::Register for #ident {
            const NAME: &'static str = #name;

            fn register(ty: ::wiring::TypeBuilder<Self>) -> ::wiring::TypeBuilder<Self> {
                ty.constructor(|#args_pat: ::wiring::Arguments| {
                    #(#field_lets)*
                    args.finish()?;
                    Ok(#construct)
                })
                #(#properties)*
            }
        }
    }
    .into()
}

enum MemberKind {
    Constructor,
    Method(Option<String>),
    Property(String),
}

fn member_kind(method: &ImplItemFn) -> syn::Result<Option<MemberKind>> {
    let mut kind = None;
    for attr in &method.attrs {
        let next = if attr.path().is_ident(CONSTRUCTOR_ATTR) {
            MemberKind::Constructor
        } else if attr.path().is_ident(METHOD_ATTR) {
            MemberKind::Method(attr_name(attr)?)
        } else if attr.path().is_ident(PROPERTY_ATTR) {
            match attr_name(attr)? {
                Some(name) => MemberKind::Property(name),
                None => {
                    return Err(Error::new(
                        attr.span(),
                        "Property setters must be named: #[property(\"name\")]",
                    ));
                }
            }
        } else {
            continue;
        };
        if kind.is_some() {
            return Err(Error::new(
                attr.span(),
                "Only one of #[constructor], #[method] or #[property] is allowed",
            ));
        }
        kind = Some(next);
    }
    Ok(kind)
}

fn is_member_attr(attr: &Attribute) -> bool {
    attr.path().is_ident(CONSTRUCTOR_ATTR)
        || attr.path().is_ident(METHOD_ATTR)
        || attr.path().is_ident(PROPERTY_ATTR)
}

enum Receiver {
    None,
    Shared,
    Exclusive,
}

struct Signature {
    receiver: Receiver,
    arg_names: Vec<proc_macro2::TokenStream>,
    arg_lets: Vec<proc_macro2::TokenStream>,
    is_result: bool,
    returns_instance: bool,
}

fn parse_signature(method: &ImplItemFn, self_ident: Option<&str>) -> syn::Result<Signature> {
    let mut receiver = Receiver::None;
    let mut arg_names = Vec::new();
    let mut arg_lets = Vec::new();
    for (index, fn_arg) in method.sig.inputs.iter().enumerate() {
        match fn_arg {
            FnArg::Receiver(r) => {
                if r.reference.is_none() {
                    return Err(Error::new(
                        r.span(),
                        "Methods must take self by reference",
                    ));
                }
                receiver = if r.mutability.is_some() {
                    Receiver::Exclusive
                } else {
                    Receiver::Shared
                };
            }
            FnArg::Typed(pat_type) => {
                let arg_ty = &pat_type.ty;
                if let Type::Reference(_) = arg_ty.as_ref() {
                    return Err(Error::new(
                        arg_ty.span(),
                        "Arguments must be owned types implementing FromValue",
                    ));
                }
                let arg_name = match pat_type.pat.as_ref() {
                    Pat::Ident(pat_ident) => pat_ident.ident.clone(),
                    Pat::Wild(_) => format_ident!("__arg{}", index),
                    _ => {
                        return Err(Error::new(
                            pat_type.pat.span(),
                            "Only simple bindings supported",
                        ));
                    }
                };
                arg_lets.push(quote! {
                    let #arg_name = args.arg::<#arg_ty>()?;
                });
                arg_names.push(quote! { #arg_name });
            }
        }
    }
    if method.sig.asyncness.is_some() {
        return Err(Error::new(
            method.sig.span(),
            "Registered functions cannot be async",
        ));
    }
    let (is_result, returns_instance) = match &method.sig.output {
        ReturnType::Default => (false, false),
        ReturnType::Type(_, ty) => (is_result_type(ty), is_instance_type(ty, self_ident)),
    };
    Ok(Signature {
        receiver,
        arg_names,
        arg_lets,
        is_result,
        returns_instance,
    })
}

fn member_registration(
    method: &ImplItemFn,
    kind: &MemberKind,
    self_ident: Option<&str>,
) -> syn::Result<proc_macro2::TokenStream> {
    let fn_ident = &method.sig.ident;
    let Signature {
        receiver,
        arg_names,
        arg_lets,
        is_result,
        returns_instance,
    } = parse_signature(method, self_ident)?;
    let args_pat = if arg_lets.is_empty() {
        quote! { args }
    } else {
        quote! { mut args }
    };

    match kind {
        MemberKind::Constructor => {
            if !matches!(receiver, Receiver::None) {
                return Err(Error::new(
                    method.sig.span(),
                    "Constructor cannot have self parameter",
                ));
            }
            let call = if is_result {
                quote! { Self::#fn_ident(#(#arg_names),*).map_err(::std::convert::Into::into) }
            } else {
                quote! { Ok(Self::#fn_ident(#(#arg_names),*)) }
            };
            Ok(quote! {
                .constructor(|#args_pat: ::wiring::Arguments| {
                    #(#arg_lets)*
                    args.finish()?;
                    #call
                })
            })
        }
        MemberKind::Property(name) => {
            if !matches!(receiver, Receiver::Exclusive) || arg_names.len() != 1 {
                return Err(Error::new(
                    method.sig.span(),
                    "Property setters must take &mut self and exactly one argument",
                ));
            }
            let call = if is_result {
                quote! {
                    this.#fn_ident(#(#arg_names),*)
                        .map_err(::std::convert::Into::<::wiring::StdError>::into)?;
                }
            } else {
                quote! { this.#fn_ident(#(#arg_names),*); }
            };
            Ok(quote! {
                .property(#name, |this: &mut Self, value: ::wiring::Value| {
                    let mut args = ::wiring::Arguments::new(::std::vec![value]);
                    #(#arg_lets)*
                    #call
                    Ok(())
                })
            })
        }
        MemberKind::Method(name) => {
            let name = name.clone().unwrap_or_else(|| fn_ident.to_string());
            // Instances of the registered type become shared objects.
            let wrap = if returns_instance {
                quote! { ::wiring::Value::object }
            } else {
                quote! { ::wiring::Value::from }
            };
            let output = |call: proc_macro2::TokenStream| {
                if is_result {
                    quote! {
                        Ok(#wrap(
                            #call.map_err(::std::convert::Into::<::wiring::StdError>::into)?
                        ))
                    }
                } else {
                    quote! { Ok(#wrap(#call)) }
                }
            };
            Ok(match receiver {
                Receiver::None => {
                    let body = output(quote! { Self::#fn_ident(#(#arg_names),*) });
                    quote! {
                        .static_method(#name, |#args_pat: ::wiring::Arguments| {
                            #(#arg_lets)*
                            args.finish()?;
                            #body
                        })
                    }
                }
                Receiver::Shared => {
                    let body = output(quote! { this.#fn_ident(#(#arg_names),*) });
                    quote! {
                        .method(#name, |this: &Self, #args_pat: ::wiring::Arguments| {
                            #(#arg_lets)*
                            args.finish()?;
                            #body
                        })
                    }
                }
                Receiver::Exclusive => {
                    let body = output(quote! { this.#fn_ident(#(#arg_names),*) });
                    quote! {
                        .method_mut(#name, |this: &mut Self, #args_pat: ::wiring::Arguments| {
                            #(#arg_lets)*
                            args.finish()?;
                            #body
                        })
                    }
                }
            })
        }
    }
}

fn handle_register_impl(input: ItemImpl, name: Option<String>) -> TokenStream {
    if input.trait_.is_some() {
        return compile_error(Error::new(input.span(), "Trait impls are not supported"));
    }
    if !input.generics.params.is_empty() {
        return compile_error(Error::new(
            input.generics.span(),
            "Generic impls are not supported",
        ));
    }

    let self_ty = &input.self_ty;
    let name = match name.or_else(|| type_ident_name(self_ty)) {
        Some(v) => v,
        None => {
            return compile_error(Error::new(
                self_ty.span(),
                "Cannot derive a type name, use #[register(\"Name\")]",
            ));
        }
    };

    let self_ident = type_ident_name(self_ty);
    let mut registrations = Vec::new();
    let mut has_constructor = false;
    for item in &input.items {
        if let ImplItem::Fn(method) = item {
            let kind = match member_kind(method) {
                Ok(Some(v)) => v,
                Ok(None) => continue,
                Err(err) => return compile_error(err),
            };
            if let MemberKind::Constructor = kind {
                if has_constructor {
                    return compile_error(Error::new(
                        method.sig.span(),
                        "Only one constructor method allowed",
                    ));
                }
                has_constructor = true;
            }
            match member_registration(method, &kind, self_ident.as_deref()) {
                Ok(v) => registrations.push(v),
                Err(err) => return compile_error(err),
            }
        }
    }

    // Strip member attributes, they are not real attributes.
    let mut cleaned_input = input.clone();
    for item in &mut cleaned_input.items {
        if let ImplItem::Fn(method) = item {
            method.attrs.retain(|attr| !is_member_attr(attr));
        }
    }

    quote! {
        #cleaned_input

        impl ::wiring::Register for #self_ty {
            const NAME: &'static str = #name;

            fn register(ty: ::wiring::TypeBuilder<Self>) -> ::wiring::TypeBuilder<Self> {
                ty #(#registrations)*
            }
        }
    }
    .into()
}
