pub mod on_plugin_init;
pub mod request_did_start;
pub mod server_will_start;
