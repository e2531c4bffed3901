//! Drives backends through the registry the way an application would:
//! init, open, transceive, close.

use ese::hw::echo;
use ese::{Card, Error, ErrorCode, GenericError, Registry, Session};

#[test]
fn test_echo_lifecycle_through_registry() {
    let registry = Registry::with_builtins();
    let mut ese = registry.create("echo").unwrap();
    let mut rx = [0u8; 16];

    assert_eq!("echo", ese.name());
    assert_eq!(Ok(()), ese.open(None));
    assert_eq!(Ok(3), ese.transceive(&[0x80, 0xCA, 0x00], &mut rx));
    assert_eq!(&[0x80, 0xCA, 0x00], &rx[..3]);
    assert!(!ese.is_error());

    ese.close();
    ese.close();
    assert!(!ese.is_error());

    // Closing released the echo buffer, so the session is gone for good.
    assert_eq!(
        Err(Error::Backend(echo::NOT_OPEN)),
        ese.transceive(&[0x00], &mut rx),
    );
    assert_eq!(Some(ErrorCode::Backend(1)), ese.error_code());
}

#[test]
fn test_raw_error_codes_through_session() {
    let mut ese = echo::boxed();

    ese.set_error_code(-1);
    assert_eq!(
        Some("Hardware supplied no transceive implementation."),
        ese.error_message(),
    );

    ese.set_error_code(-2);
    assert_eq!(Some("Timed out polling for value."), ese.error_message());
    assert_eq!(
        Some(ErrorCode::Generic(GenericError::PollTimedOut)),
        ese.error_code(),
    );

    ese.set_error_code(2);
    assert_eq!(Some(echo::ERRORS.error(2).message()), ese.error_message());
}

#[test]
fn test_card_over_boxed_session() {
    let registry = Registry::with_builtins();
    let mut card = Card::new(registry.create("echo").unwrap());

    card.session().open(None).unwrap();

    // The echo reflects the command, so the "status word" is its last two
    // octets: 90 00 here.
    let response = card
        .exchange(ese::apdu::Command::new(0x00, 0x00, 0x90, 0x00))
        .unwrap();
    assert!(response.is_ok());
    assert_eq!(vec![0x00, 0x00], response.payload);

    card.into_inner().close();
}
