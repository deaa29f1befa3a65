pub mod wire;

pub use wire::{ApplicationContext, initialize};
