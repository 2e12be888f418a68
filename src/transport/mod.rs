pub mod transport;
pub mod messages;

pub use transport::{
    DEFAULT_HOST, DEFAULT_PORT, send_frame, recv_frame, send_message, recv_message,
};

pub use messages::{
    PointWire, CiphertextWire, PublicKeyWire, RelinKeyWire, FheContextWire,
    QueryMessage, ReplyMessage, validate_context, points_to_wire, wire_to_points,
};
