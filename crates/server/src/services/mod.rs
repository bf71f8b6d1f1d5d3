pub mod ringi;

pub use ringi::RingiService;
