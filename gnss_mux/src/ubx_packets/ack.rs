use super::UBX_CLASS_ACK;

pub const ACK_ID_NAK: u8 = 0x00;
pub const ACK_ID_ACK: u8 = 0x01;

/// Decoded UBX-ACK-ACK or UBX-ACK-NAK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UbxAck {
    /// Class ID of the acknowledged message
    pub class: u8,
    /// Message ID of the acknowledged message
    pub msg_id: u8,
    /// `false` for a NAK
    pub acked: bool,
}

impl UbxAck {
    pub const PAYLOAD_LEN: usize = 2;

    /// Decodes an ACK-class payload, `None` for other classes, ids or lengths.
    pub fn from_payload(class: u8, id: u8, payload: &[u8]) -> Option<Self> {
        if class != UBX_CLASS_ACK {
            return None;
        }
        let acked = match id {
            ACK_ID_ACK => true,
            ACK_ID_NAK => false,
            _ => return None,
        };
        match payload {
            [class, msg_id] => Some(Self {
                class: *class,
                msg_id: *msg_id,
                acked,
            }),
            _ => None,
        }
    }
}
