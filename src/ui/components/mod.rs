pub mod comment_card;
pub mod dialog;
pub mod explore;
pub mod navbar;
