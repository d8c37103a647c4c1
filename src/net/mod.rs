//! Network layer: TLS termination for the gateway listener.

pub mod tls;
