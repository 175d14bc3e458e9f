//! Game data lookups: packed ids, prototype subtypes and art lists.

pub mod art;
pub mod pid;
pub mod prototype;

pub use art::{ArtCategory, ArtList, ArtResolver};
pub use pid::ObjectType;
pub use prototype::{ItemSubtype, PrototypeIndex, ScenerySubtype};
