use super::{responses::PinStatus, types::PinStatusCode, GetPinStatus};
use crate::command::lines;
use atat::{AtatCmd, InternalError};

/// The status codes carry spaces and dashes (`PH-NET PIN`), which the
/// `serde_at` identifier reader stops at, so the line is parsed by hand.
impl AtatCmd for GetPinStatus {
    type Response = PinStatus;

    const MAX_LEN: usize = 10;
    const MAX_TIMEOUT_MS: u32 = 10_000;

    fn write(&self, buf: &mut [u8]) -> usize {
        lines::write_cmd(buf, format_args!("+CPIN?"))
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<Self::Response, atat::Error> {
        let resp = resp.map_err(atat::Error::from)?;
        let line = resp
            .split(|b| *b == b'\n')
            .map(lines::trim)
            .find(|l| l.starts_with(b"+CPIN:"))
            .ok_or(atat::Error::Parse)?;
        let token = lines::unquote(lines::trim(&line[b"+CPIN:".len()..]));
        let code = PinStatusCode::from_bytes(token).ok_or_else(|| {
            warn!("Unknown PIN status");
            atat::Error::Parse
        })?;
        Ok(PinStatus { code })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(resp: &[u8]) -> Result<PinStatusCode, atat::Error> {
        GetPinStatus.parse(Ok(resp)).map(|s| s.code)
    }

    #[test]
    fn parse_pin_status() {
        assert_eq!(parse(b"+CPIN: READY"), Ok(PinStatusCode::Ready));
        assert_eq!(parse(b"+CPIN: SIM PIN\r\n"), Ok(PinStatusCode::SimPin));
        assert_eq!(parse(b"+CPIN: SIM PUK"), Ok(PinStatusCode::SimPuk));
        assert_eq!(parse(b"+CPIN: PH-NET PIN"), Ok(PinStatusCode::PhNetPin));
        assert_eq!(parse(b"+CPIN: PH-NETSUB PIN"), Ok(PinStatusCode::PhNetSubPin));
        assert_eq!(parse(b"+CPIN: PH-SIM PIN"), Ok(PinStatusCode::PhSimPin));
        assert_eq!(parse(b"\r\n+CPIN: \"SIM PIN2\"\r\n"), Ok(PinStatusCode::SimPin2));
    }

    #[test]
    fn unknown_pin_status_is_a_parse_error() {
        assert_eq!(parse(b"+CPIN: BLOCKED"), Err(atat::Error::Parse));
        assert_eq!(parse(b""), Err(atat::Error::Parse));
    }

    #[test]
    fn writes_read_command() {
        let mut buf = [0u8; GetPinStatus::MAX_LEN];
        let len = GetPinStatus.write(&mut buf);
        assert_eq!(&buf[..len], b"AT+CPIN?\r\n");
    }
}
