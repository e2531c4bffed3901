use crate::apdu::{CLA_DEFAULT, INS_GET_RESPONSE, INS_SELECT};

/// A command APDU to be transmitted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Command {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    le: Option<u8>,
    payload: Option<Vec<u8>>,
}

impl Command {
    /// Constructs a command with CLA, INS, P1, and P2.
    /// No payloads will be transmitted or received.
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            le: None,
            payload: None,
        }
    }

    /// Constructs a command with CLA, INS, P1, P2, and Le.
    pub fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8) -> Self {
        Self {
            le: Some(le),
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Constructs a command with CLA, INS, P1, P2, and a payload.
    /// An empty payload is sent as no payload at all.
    pub fn new_with_payload(cla: u8, ins: u8, p1: u8, p2: u8, payload: Vec<u8>) -> Self {
        Self {
            payload: (!payload.is_empty()).then_some(payload),
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Constructs a command with CLA, INS, P1, P2, Le, and a payload.
    pub fn new_with_payload_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8, payload: Vec<u8>) -> Self {
        Self {
            le: Some(le),
            ..Self::new_with_payload(cla, ins, p1, p2, payload)
        }
    }

    /// Constructs a `SELECT` by DF name, e.g. an applet AID.
    pub fn select(aid: Vec<u8>) -> Self {
        Self::new_with_payload_le(CLA_DEFAULT, INS_SELECT, 0x04, 0x00, 0x00, aid)
    }

    /// Constructs a `GET RESPONSE` fetching `le` pending octets.
    pub fn get_response(le: u8) -> Self {
        Self::new_with_le(CLA_DEFAULT, INS_GET_RESPONSE, 0x00, 0x00, le)
    }

    /// Converts the command into octets (short length encoding).
    pub fn into_bytes(self) -> Vec<u8> {
        let Self {
            cla,
            ins,
            p1,
            p2,
            le,
            payload,
        } = self;

        let mut buffer: Vec<u8> = vec![cla, ins, p1, p2];
        if let Some(mut p) = payload {
            buffer.push(p.len() as u8);
            buffer.append(&mut p);
        }

        if let Some(l) = le {
            buffer.push(l);
        }

        buffer
    }
}

impl From<Command> for Vec<u8> {
    fn from(command: Command) -> Self {
        command.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(
            vec![0x00, 0xA4, 0x04, 0x00, 0x03, 0xA0, 0x00, 0x01, 0x00],
            Command::select(vec![0xA0, 0x00, 0x01]).into_bytes(),
        );
    }

    #[test]
    fn test_empty_payload_is_omitted() {
        assert_eq!(
            vec![0x80, 0xCA, 0x9F, 0x7F],
            Vec::from(Command::new_with_payload(0x80, 0xCA, 0x9F, 0x7F, vec![])),
        );
    }
}
