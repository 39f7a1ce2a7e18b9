pub mod scholars_client;

pub use scholars_client::ScholarsHttpClient;
