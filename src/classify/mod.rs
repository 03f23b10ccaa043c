pub mod category;
pub mod guard;
pub mod view;
