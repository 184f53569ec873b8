pub mod inspect;
pub mod mask;
pub mod regions;
