use crate::apdu::{self, Command, Response};
use crate::session::Session;

/// Receive buffer size of a single exchange: a short APDU answer plus SW1/SW2.
pub const RX_BUFFER_SIZE: usize = 258;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error occurred while communicating with the secure element: {0}")]
    Ese(#[from] crate::Error),

    #[error("{0}")]
    Apdu(#[from] apdu::Error),
}

/// An adapter to exchange APDUs with a secure element through a session.
pub struct Card<S>
where
    S: Session,
{
    ese: S,
}

impl<S> Card<S>
where
    S: Session,
{
    /// Initiates an adapter over an opened session.
    pub fn new(ese: S) -> Self {
        Self { ese }
    }

    pub fn session(&mut self) -> &mut S {
        &mut self.ese
    }

    /// Gives the session back, e.g. to close it.
    pub fn into_inner(self) -> S {
        self.ese
    }

    /// Selects an applet with its AID.
    pub fn select(&mut self, aid: Vec<u8>) -> Result<Vec<u8>, Error> {
        self.handle(Command::select(aid))
    }

    /// Sends the command and returns the response payload, fetching any
    /// octets the card holds back with `GET RESPONSE`.
    pub fn handle(&mut self, command: impl Into<Command>) -> Result<Vec<u8>, Error> {
        let mut response = self.exchange(command.into())?;
        let mut payload = Vec::new();

        while let Some(le) = response.remaining() {
            debug!("Card has {} more octets", le);

            payload.append(&mut response.payload);
            response = self.exchange(Command::get_response(le))?;
        }

        payload.append(&mut response.into_result()?);

        Ok(payload)
    }

    /// Sends the command and returns the raw response, status word included.
    pub fn exchange(&mut self, command: Command) -> Result<Response, Error> {
        let tx = Vec::from(command);
        let mut rx = [0u8; RX_BUFFER_SIZE];
        let len = self.ese.transceive(&tx, &mut rx)?;

        Ok(Response::from(rx[..len].to_vec()))
    }
}
