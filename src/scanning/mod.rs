/// Scanning domain: value objects, manifest parsers, rule catalogues and pure services
pub mod domain;
pub mod parsers;
pub mod rules;
pub mod services;
