pub mod settings;

pub use settings::NotifierConfig;
