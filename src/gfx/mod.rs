pub mod framebuffer;
pub mod sprite;
pub mod texture;

pub use framebuffer::Framebuffer;
pub use texture::Texture;
