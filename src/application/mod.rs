//! Application layer - services orchestrating the domain, and the ports
//! they reach external collaborators through

pub mod ports;
pub mod services;
