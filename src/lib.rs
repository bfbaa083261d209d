//! Loki configuration rollout and query load testing.

pub use lokiprobe_application as application;
pub use lokiprobe_domain as domain;
pub use lokiprobe_ports as ports;

pub use lokiprobe_application::{PortSet, Workflow};
pub use lokiprobe_domain::{ConfigDocument, ProbeConfig, ProbeError};
