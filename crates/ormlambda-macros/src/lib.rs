//! Procedural macros for ormlambda.
//!
//! `ormlambda-macros` is the **compile-time codegen layer**. It turns Rust structs into
//! fully described tables by generating static metadata and trait implementations.
//!
//! # Role In The Architecture
//!
//! - **Table metadata**: `#[derive(Table)]` produces a `Table` implementation with
//!   column and relationship metadata consumed by the query compiler and the engine.
//! - **Typed proxies**: every table gets a `{Name}Proxy` whose methods return typed
//!   column handles and, for each relationship, the target table's proxy with the
//!   traversal path extended by one step.
//!
//! Generated code refers to `::ormlambda_core` and `::ormlambda_query`, so crates
//! deriving `Table` depend on both.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};

mod infer;
mod parse;
mod validate;

use parse::{FieldDef, ForeignKeyDef, TableDef, is_option_type, parse_table};

/// Derive macro for the `Table` trait.
///
/// This macro generates:
/// - Static column and relationship metadata
/// - Row conversion (`to_row`, `from_row`)
/// - A `{Name}Proxy` type with one method per column and per relationship
///
/// # Attributes
///
/// On the struct:
/// - `#[ormlambda(table = "name")]` - Table name (required)
/// - `#[ormlambda(foreign_key(name = "rel", table = Other, left = "col", right = "other_col"))]` -
///   Declare a relationship; `op = "..."` overrides the `=` join predicate
///
/// On fields:
/// - `#[ormlambda(primary_key)]` - Mark field as primary key
/// - `#[ormlambda(auto_increment)]` - Assigned by the database when left unset on insert
/// - `#[ormlambda(auto_generated)]` - Always computed by the database, never written
/// - `#[ormlambda(unique)]` - Add unique constraint
/// - `#[ormlambda(not_null)]` - Force NOT NULL (non-`Option` fields already are)
/// - `#[ormlambda(default = "expr")]` - Set default SQL expression
/// - `#[ormlambda(column = "name")]` - Override column name
/// - `#[ormlambda(sql_type = "VARCHAR(40)")]` - Override the SQL type inferred from the field type
/// - `#[ormlambda(skip)]` - Not a column; filled with `Default::default()` when read
///
/// # Example
///
/// ```ignore
/// use ormlambda::prelude::*;
///
/// #[derive(Table)]
/// #[ormlambda(table = "address")]
/// #[ormlambda(foreign_key(name = "city", table = City, left = "city_id", right = "city_id"))]
/// struct Address {
///     #[ormlambda(primary_key, auto_increment)]
///     address_id: Option<i64>,
///     address: Option<String>,
///     city_id: Option<i64>,
/// }
///
/// // Address::proxy().city().country().country() is a typed column
/// // reached through two joins.
/// ```
#[proc_macro_derive(Table, attributes(ormlambda))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    let table = match parse_table(&input) {
        Ok(t) => t,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Err(e) = validate::validate_table(&table) {
        return e.to_compile_error().into();
    }

    generate_table_impl(&table).into()
}

/// Generate the Table implementation and the proxy type.
fn generate_table_impl(table: &TableDef) -> TokenStream2 {
    let name = &table.name;
    let proxy = table.proxy_name();
    let vis = &table.vis;
    let Some(table_name) = &table.table_name else {
        return TokenStream2::new();
    };

    let columns: Vec<&FieldDef> = table.column_fields().collect();
    let column_count = columns.len();
    let column_infos = columns.iter().map(|f| generate_column_info(table, f));
    let fk_count = table.foreign_keys.len();
    let fk_infos = table
        .foreign_keys
        .iter()
        .map(|fk| generate_foreign_key_info(table, fk));

    let to_row = generate_to_row(&columns);
    let from_row = generate_from_row(table);
    let column_methods = columns.iter().enumerate().map(|(i, f)| {
        let method = &f.name;
        let ty = &f.ty;
        let doc = format!("Column `{}.{}`.", table_name.value(), f.column_name);
        quote! {
            #[doc = #doc]
            pub fn #method(&self) -> ::ormlambda_query::Column<#ty> {
                ::ormlambda_query::Column::new(
                    ::core::clone::Clone::clone(&self.path),
                    &<#name as ::ormlambda_core::Table>::meta().columns[#i],
                )
            }
        }
    });
    let relationship_methods = table.foreign_keys.iter().enumerate().map(|(i, fk)| {
        let method = format_ident!("{}", fk.name.value());
        let target = target_type(table, fk);
        let doc = format!("Follow relationship `{}`.", fk.name.value());
        quote! {
            #[doc = #doc]
            pub fn #method(&self) -> <#target as ::ormlambda_core::Table>::Proxy {
                <<#target as ::ormlambda_core::Table>::Proxy as ::ormlambda_core::TableProxy>::from_path(
                    self.path.traverse(&<#name as ::ormlambda_core::Table>::meta().foreign_keys[#i]),
                )
            }
        }
    });
    let proxy_doc = format!("Typed view of `{}` reached through a relationship path.", name);

    quote! {
        impl ::ormlambda_core::Table for #name {
            const TABLE_NAME: &'static str = #table_name;
            type Proxy = #proxy;

            fn meta() -> &'static ::ormlambda_core::TableMeta {
                static COLUMNS: [::ormlambda_core::ColumnInfo; #column_count] = [#(#column_infos),*];
                static FOREIGN_KEYS: [::ormlambda_core::ForeignKeyInfo; #fk_count] = [#(#fk_infos),*];
                static META: ::ormlambda_core::TableMeta = ::ormlambda_core::TableMeta {
                    name: #table_name,
                    columns: &COLUMNS,
                    foreign_keys: &FOREIGN_KEYS,
                };
                &META
            }

            fn to_row(&self) -> ::std::vec::Vec<(&'static str, ::ormlambda_core::Value)> {
                #to_row
            }

            fn from_row(row: &::ormlambda_core::Row) -> ::ormlambda_core::Result<Self> {
                #from_row
            }
        }

        #[doc = #proxy_doc]
        #[derive(Debug, Clone)]
        #vis struct #proxy {
            path: ::ormlambda_core::TablePath,
        }

        impl ::ormlambda_core::TableProxy for #proxy {
            fn from_path(path: ::ormlambda_core::TablePath) -> Self {
                Self { path }
            }

            fn path(&self) -> &::ormlambda_core::TablePath {
                &self.path
            }
        }

        impl ::ormlambda_query::IntoSelectItem for #proxy {
            fn into_select_item(self) -> ::ormlambda_query::SelectItem {
                ::ormlambda_query::SelectItem::Table(self.path)
            }
        }

        #[allow(dead_code)]
        impl #proxy {
            #(#column_methods)*
            #(#relationship_methods)*
        }
    }
}

/// One `ColumnInfo` constructor.
fn generate_column_info(table: &TableDef, field: &FieldDef) -> TokenStream2 {
    let table_name = table.table_name.as_ref().map(syn::LitStr::value).unwrap_or_default();
    let column_name = &field.column_name;
    let sql_type = infer::column_sql_type(&field.ty, field.sql_type.as_ref());
    let not_null = field.not_null.unwrap_or(!is_option_type(&field.ty));
    let primary_key = field.primary_key;
    let auto_increment = field.auto_increment;
    let auto_generated = field.auto_generated;
    let unique = field.unique;
    let default_ts = match &field.default {
        Some(d) => quote! { ::core::option::Option::Some(#d) },
        None => quote! { ::core::option::Option::None },
    };

    quote! {
        ::ormlambda_core::ColumnInfo::new(#table_name, #column_name, #sql_type)
            .not_null(#not_null)
            .primary_key(#primary_key)
            .auto_increment(#auto_increment)
            .auto_generated(#auto_generated)
            .unique(#unique)
            .default_opt(#default_ts)
    }
}

/// The relationship's target type, with `Self` spelled out so it can be
/// named inside a `static`.
fn target_type(table: &TableDef, fk: &ForeignKeyDef) -> TokenStream2 {
    if fk.table.is_ident("Self") {
        let name = &table.name;
        quote! { #name }
    } else {
        let path = &fk.table;
        quote! { #path }
    }
}

/// One `ForeignKeyInfo` constructor.
fn generate_foreign_key_info(table: &TableDef, fk: &ForeignKeyDef) -> TokenStream2 {
    let name = &fk.name;
    let left = &fk.left;
    let right = &fk.right;
    let target = target_type(table, fk);
    let op = fk
        .op
        .as_ref()
        .and_then(|op| infer::join_operator(&op.value()))
        .unwrap_or_else(|| quote! { ::ormlambda_core::CompareOp::Eq });

    quote! {
        ::ormlambda_core::ForeignKeyInfo::new(
            #name,
            #left,
            ::ormlambda_core::TableRef::of::<#target>,
            #right,
        )
        .op(#op)
    }
}

/// Generate the to_row method body.
fn generate_to_row(columns: &[&FieldDef]) -> TokenStream2 {
    let conversions = columns.iter().map(|field| {
        let field_name = &field.name;
        let column_name = &field.column_name;
        quote! {
            (#column_name, ::ormlambda_core::Value::from(::core::clone::Clone::clone(&self.#field_name)))
        }
    });

    quote! {
        vec![#(#conversions),*]
    }
}

/// Generate the from_row method body.
fn generate_from_row(table: &TableDef) -> TokenStream2 {
    let fields = table.fields.iter().map(|field| {
        let field_name = &field.name;
        if field.skip {
            quote! { #field_name: ::core::default::Default::default() }
        } else {
            let column_name = &field.column_name;
            quote! { #field_name: row.get_named(#column_name)? }
        }
    });

    quote! {
        ::core::result::Result::Ok(Self {
            #(#fields),*
        })
    }
}
