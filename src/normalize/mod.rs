//! Field normalizers shared by every workflow.

pub mod business;
pub mod email;
pub mod name;
pub mod phone;

pub use business::{is_company_name, is_valid_last_name};
pub use email::{clean_email, is_generic_mailbox, is_valid_email};
pub use name::{clean_name_for_display, split_name};
pub use phone::{clean_phone, clean_phone_cell, format_phone};
