pub mod controls;
pub mod status_bar;
pub mod text_field;
pub mod toast;
