//! Contexto de ejecución compartido (`StateBag`) y sus claves conocidas.

mod bag;
pub mod keys;

pub use bag::StateBag;
