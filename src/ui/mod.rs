pub mod icons;
pub mod keys;
pub mod render;
pub mod wayland;
