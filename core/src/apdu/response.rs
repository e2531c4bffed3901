use crate::apdu::Error;

/// A response APDU received from the card.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Response {
    pub payload: Vec<u8>,
    pub trailer: (u8, u8),
}

impl Response {
    /// Parses a response from the octets, the last two being the status word.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        let sw2 = bytes.pop();
        let sw1 = bytes.pop();

        Self {
            payload: bytes,
            trailer: match (sw1, sw2) {
                (Some(a), Some(b)) => (a, b),
                _ => (0x00, 0x00),
            },
        }
    }

    /// Determines whether the response indicates success or not.
    pub fn is_ok(&self) -> bool {
        matches!(self.trailer, (0x90, 0x00) | (0x91, 0x00))
    }

    /// Number of octets still waiting on the card (`61 XX`), if any.
    pub fn remaining(&self) -> Option<u8> {
        match self.trailer {
            (0x61, le) => Some(le),
            _ => None,
        }
    }

    /// Converts the response to a result of octets.
    pub fn into_result(self) -> Result<Vec<u8>, Error> {
        match self.is_ok() {
            true => Ok(self.payload),
            _ => Err(self.trailer.into()),
        }
    }
}

impl From<Vec<u8>> for Response {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let response = Response::from(vec![0x01, 0x02, 0x90, 0x00]);

        assert!(response.is_ok());
        assert_eq!(Ok(vec![0x01, 0x02]), response.into_result());
    }

    #[test]
    fn test_error_status() {
        let response = Response::from(vec![0x6A, 0x82]);

        assert!(!response.is_ok());
        assert_eq!(None, response.remaining());
        assert_eq!(
            Err(Error {
                sw1: 0x6A,
                sw2: 0x82,
            }),
            response.into_result(),
        );
    }

    #[test]
    fn test_too_short() {
        let response = Response::from(vec![0x90]);

        assert_eq!((0x00, 0x00), response.trailer);
        assert!(response.payload.is_empty());
    }

    #[test]
    fn test_remaining() {
        assert_eq!(Some(0x10), Response::from(vec![0x61, 0x10]).remaining());
    }
}
