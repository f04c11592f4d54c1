//! Procedural macros for recordkit
//!
//! This crate provides the declaration derive used by every entity type:
//!
//! - `#[derive(Entity)]` - Generate the static entity declaration, the column
//!   mapping, and one lazy accessor per relationship field

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, Path,
    PathArguments, Type, Visibility,
};

/// Derive the `recordkit::orm::Entity` implementation for a struct.
///
/// # Usage
///
/// ```ignore
/// #[derive(Entity, Debug, Clone, Default)]
/// #[entity(table = "users")]
/// pub struct User {
///     #[primary_key]
///     pub id: Option<i64>,
///     pub name: String,
///     pub id_city: Option<i64>,
///
///     #[relation(cardinality = "has_one", target = City)]
///     city: HasOne<City>,
///
///     #[relation(cardinality = "has_many", target = Role, join_table = "users_roles", order = "name asc")]
///     roles: HasMany<Role>,
///
///     #[state]
///     _state: RecordState,
/// }
/// ```
///
/// # Generated Code
///
/// - `impl Entity for User` with the declaration and column mapping
/// - `impl SaveHooks for User {}` unless `#[entity(hooks)]` is present
/// - `User::city(&self, storage)` and `User::roles(&self, storage)` accessors
///
/// Only `pub` fields whose name does not start with `_` are mapped to columns.
#[proc_macro_derive(Entity, attributes(entity, primary_key, relation, state))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_entity(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Struct-level `#[entity(...)]` options
#[derive(Default)]
struct EntityOptions {
    table: Option<LitStr>,
    foreign_key: Option<LitStr>,
    custom_hooks: bool,
}

/// Field-level `#[relation(...)]` options
struct RelationOptions {
    cardinality: LitStr,
    target: Option<Path>,
    join_table: Option<LitStr>,
    order: Option<LitStr>,
    foreign_key: Option<LitStr>,
}

enum RelationKind {
    One,
    Many,
}

struct RelationField<'a> {
    ident: &'a Ident,
    kind: RelationKind,
    inner: &'a Type,
    options: RelationOptions,
}

struct ColumnField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    primary_key: bool,
}

fn expand_entity(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Entity can only be derived for structs",
            ));
        }
    };

    let options = parse_entity_options(input)?;

    let mut columns: Vec<ColumnField> = Vec::new();
    let mut relations: Vec<RelationField> = Vec::new();
    let mut state: Option<&Ident> = None;

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        if has_attr(field, "state") {
            if state.is_some() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "only one #[state] field is allowed",
                ));
            }
            state = Some(ident);
            continue;
        }

        if let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("relation")) {
            let (kind, inner) = relation_wrapper(&field.ty).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "relation fields must be HasOne<T> or HasMany<T>",
                )
            })?;
            relations.push(RelationField {
                ident,
                kind,
                inner,
                options: parse_relation_options(attr)?,
            });
            continue;
        }

        if !matches!(field.vis, Visibility::Public(_)) || ident.to_string().starts_with('_') {
            continue;
        }

        columns.push(ColumnField {
            ident,
            ty: &field.ty,
            primary_key: has_attr(field, "primary_key"),
        });
    }

    let state = state.ok_or_else(|| {
        syn::Error::new(
            Span::call_site(),
            "Entity requires a #[state] field of type RecordState",
        )
    })?;

    let primary_key = columns
        .iter()
        .find(|c| c.primary_key)
        .or_else(|| columns.iter().find(|c| c.ident == "id"))
        .map(|c| c.ident)
        .ok_or_else(|| {
            syn::Error::new_spanned(
                name,
                "Entity requires a #[primary_key] field or a public `id` field",
            )
        })?;

    let type_name = name.to_string();
    let primary_key_name = primary_key.to_string();
    let table = option_tokens(options.table.as_ref());
    let entity_foreign_key = option_tokens(options.foreign_key.as_ref());

    let column_names: Vec<String> = columns.iter().map(|c| c.ident.to_string()).collect();

    // Every column is decoded before any field is written, so a bad value
    // leaves the entity untouched.
    let decode = columns.iter().map(|c| {
        let ident = c.ident;
        let local = format_ident!("__decoded_{}", ident);
        let column = ident.to_string();
        let ty = c.ty;
        quote! {
            let #local: Option<#ty> = match row.get(#column) {
                Some(value) => Some(
                    <#ty as ::recordkit::orm::ColumnValue>::from_sql_value(value).ok_or(
                        ::recordkit::orm::OrmError::Decode {
                            entity: #type_name,
                            column: #column,
                            expected: <#ty as ::recordkit::orm::ColumnValue>::KIND,
                        },
                    )?,
                ),
                None => None,
            };
        }
    });

    let assign = columns.iter().map(|c| {
        let ident = c.ident;
        let local = format_ident!("__decoded_{}", ident);
        quote! {
            if let Some(value) = #local {
                self.#ident = value;
            }
        }
    });

    let project = columns.iter().map(|c| {
        let ident = c.ident;
        let column = ident.to_string();
        quote! {
            row.insert(
                #column.to_string(),
                ::recordkit::orm::ColumnValue::to_sql_value(&self.#ident),
            );
        }
    });

    let lookup = columns.iter().map(|c| {
        let ident = c.ident;
        let column = ident.to_string();
        quote! {
            #column => Some(::recordkit::orm::ColumnValue::to_sql_value(&self.#ident)),
        }
    });

    let declarations = relations.iter().map(|r| {
        let field = r.ident.to_string();
        let cardinality = &r.options.cardinality;
        let target = match &r.options.target {
            Some(path) => quote! { Some(::recordkit::orm::EntityRef::of::<#path>()) },
            None => quote! { None },
        };
        let join_table = option_tokens(r.options.join_table.as_ref());
        let order = option_tokens(r.options.order.as_ref());
        let foreign_key = option_tokens(r.options.foreign_key.as_ref());
        quote! {
            ::recordkit::orm::RelationDeclaration {
                field: #field,
                cardinality: #cardinality,
                target: #target,
                join_table: #join_table,
                order: #order,
                foreign_key: #foreign_key,
            }
        }
    });

    let accessors = relations.iter().map(|r| {
        let ident = r.ident;
        let field = ident.to_string();
        let inner = r.inner;
        let doc = format!(" Lazily resolve the `{}` relationship.", field);
        match r.kind {
            RelationKind::One => quote! {
                #[doc = #doc]
                pub async fn #ident(
                    &self,
                    storage: &dyn ::recordkit::orm::Storage,
                ) -> ::recordkit::orm::Result<&#inner> {
                    self.#ident.load(self, #field, storage).await
                }
            },
            RelationKind::Many => quote! {
                #[doc = #doc]
                pub async fn #ident(
                    &self,
                    storage: &dyn ::recordkit::orm::Storage,
                ) -> ::recordkit::orm::Result<&[#inner]> {
                    self.#ident.load(self, #field, storage).await
                }
            },
        }
    });

    let hooks = if options.custom_hooks {
        quote! {}
    } else {
        quote! {
            impl ::recordkit::orm::SaveHooks for #name {}
        }
    };

    let setters = relations.iter().map(|r| {
        let ident = r.ident;
        let setter = format_ident!("set_{}", ident);
        let inner = r.inner;
        match r.kind {
            RelationKind::One => quote! {
                /// Supply an already-loaded value so the relationship is not queried.
                pub fn #setter(&self, value: #inner) -> bool {
                    self.#ident.set(value)
                }
            },
            RelationKind::Many => quote! {
                /// Supply already-loaded values so the relationship is not queried.
                pub fn #setter(&self, value: Vec<#inner>) -> bool {
                    self.#ident.set(value)
                }
            },
        }
    });

    Ok(quote! {
        impl ::recordkit::orm::Entity for #name {
            fn declaration() -> ::recordkit::orm::EntityDeclaration {
                ::recordkit::orm::EntityDeclaration {
                    type_name: #type_name,
                    table: #table,
                    foreign_key: #entity_foreign_key,
                    primary_key: #primary_key_name,
                    columns: &[#(#column_names),*],
                    relations: vec![#(#declarations),*],
                }
            }

            fn id(&self) -> Option<i64> {
                self.#primary_key
            }

            fn set_id(&mut self, id: Option<i64>) {
                self.#primary_key = id;
            }

            fn record_state(&self) -> &::recordkit::orm::RecordState {
                &self.#state
            }

            fn record_state_mut(&mut self) -> &mut ::recordkit::orm::RecordState {
                &mut self.#state
            }

            fn assign_columns(
                &mut self,
                row: &::recordkit::orm::Row,
            ) -> ::recordkit::orm::Result<()> {
                #(#decode)*
                #(#assign)*
                Ok(())
            }

            fn column_values(&self) -> ::recordkit::orm::Row {
                let mut row = ::recordkit::orm::Row::new();
                #(#project)*
                row
            }

            fn column_value(&self, column: &str) -> Option<::recordkit::orm::SqlValue> {
                match column {
                    #(#lookup)*
                    _ => None,
                }
            }
        }

        #hooks

        impl #name {
            #(#accessors)*

            #(#setters)*
        }
    })
}

fn parse_entity_options(input: &DeriveInput) -> syn::Result<EntityOptions> {
    let mut options = EntityOptions::default();

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                options.table = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("foreign_key") {
                options.foreign_key = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("hooks") {
                options.custom_hooks = true;
            } else {
                return Err(meta.error("unsupported entity option"));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

fn parse_relation_options(attr: &syn::Attribute) -> syn::Result<RelationOptions> {
    let mut cardinality: Option<LitStr> = None;
    let mut target: Option<Path> = None;
    let mut join_table: Option<LitStr> = None;
    let mut order: Option<LitStr> = None;
    let mut foreign_key: Option<LitStr> = None;

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("cardinality") {
            cardinality = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("target") {
            target = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("join_table") {
            join_table = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("order") {
            order = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("foreign_key") {
            foreign_key = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error("unsupported relation option"));
        }
        Ok(())
    })?;

    let cardinality = cardinality
        .ok_or_else(|| syn::Error::new_spanned(attr, "relation requires `cardinality = \"...\"`"))?;

    Ok(RelationOptions {
        cardinality,
        target,
        join_table,
        order,
        foreign_key,
    })
}

fn has_attr(field: &Field, name: &str) -> bool {
    field.attrs.iter().any(|a| a.path().is_ident(name))
}

/// Split `HasOne<T>` / `HasMany<T>` into the relation kind and `T`.
fn relation_wrapper(ty: &Type) -> Option<(RelationKind, &Type)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let kind = match segment.ident.to_string().as_str() {
        "HasOne" => RelationKind::One,
        "HasMany" => RelationKind::Many,
        _ => return None,
    };
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some((kind, inner)),
        _ => None,
    }
}

fn option_tokens(value: Option<&LitStr>) -> proc_macro2::TokenStream {
    match value {
        Some(lit) => quote! { Some(#lit) },
        None => quote! { None },
    }
}
