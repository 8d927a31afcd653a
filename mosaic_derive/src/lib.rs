//! Procedural macros shared by the mosaic crates.
//!
//! The only macro is [`macro@context`], which wraps a function returning `anyhow::Result`
//! so that every error leaving it carries a formatted context message:
//!
//! ```ignore
//! #[context("reading tile {} of {}", index, input)]
//! fn read_tile(index: u32, input: &str) -> anyhow::Result<Vec<u8>> { /* ... */ }
//! ```
//!
//! The format arguments are evaluated when the error is mapped, so they may refer to the
//! function's parameters. Prefix them with `move,` when the body consumes a parameter that
//! the message also needs.

mod args;

use args::ContextArgs;
use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::{ToTokens, quote};
use syn::parse_macro_input;

#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let ContextArgs { move_token, message } = parse_macro_input!(args);
	let mut function = parse_macro_input!(input as syn::ItemFn);

	let body = &function.block;
	let output = &function.sig.output;
	let error = Ident::new("error", Span::mixed_site());

	let wrapped = if function.sig.asyncness.is_some() {
		let result_type = match output {
			syn::ReturnType::Default => {
				return syn::Error::new_spanned(function, "#[context] needs a function returning Result")
					.to_compile_error()
					.into();
			}
			syn::ReturnType::Type(_, ty) => ty,
		};
		let result = Ident::new("result", Span::mixed_site());
		quote! {
			let #result: #result_type = async #move_token { #body }.await;
			#result.map_err(|#error| #error.context(format!(#message)).into())
		}
	} else {
		let once = Ident::new("once", Span::mixed_site());
		quote! {
			// Owning a non-Copy value makes the closure FnOnce for the borrow checker.
			let #once = ::core::iter::empty::<()>();
			(#move_token || #output {
				::core::mem::drop(#once);
				#body
			})().map_err(|#error| #error.context(format!(#message)).into())
		}
	};
	function.block.stmts = vec![syn::Stmt::Expr(syn::Expr::Verbatim(wrapped), None)];

	function.into_token_stream().into()
}
