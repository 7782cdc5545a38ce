//! Clause parsers. Each submodule adds methods to [`crate::SqlParser`] for
//! one grammar fragment.

mod alias;
mod condition;
mod expression;
mod limit;
mod order_by;
mod select_list;
mod select_option;
mod table_references;
