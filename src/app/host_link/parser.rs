#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum HostCommand {
    Connect,
    Disconnect,
    Set {
        channel: u16,
        threshold: u16,
        keycode: u8,
    },
}

/// Parses one accumulated command line. Commands match byte-for-byte; the
/// reader has already stripped the terminator, and anything else yields
/// `None` and is discarded without a reply; the link has no error channel.
pub(super) fn parse_host_command(line: &[u8]) -> Option<HostCommand> {
    if line == b"CONNECT" {
        return Some(HostCommand::Connect);
    }
    if line == b"DISCONNECT" {
        return Some(HostCommand::Disconnect);
    }
    if let Some(args) = line.strip_prefix(b"SET:".as_slice()) {
        return parse_set_arguments(args);
    }
    None
}

fn parse_set_arguments(args: &[u8]) -> Option<HostCommand> {
    let (channel, i) = parse_u64_ascii(args, 0)?;
    let i = expect_byte(args, i, b',')?;
    let (threshold, i) = parse_u64_ascii(args, i)?;
    let i = expect_byte(args, i, b',')?;
    let (keycode, i) = parse_u64_ascii(args, i)?;
    if i != args.len() {
        return None;
    }
    // Channel range is the store's call; value range is the wire format's.
    if channel > u16::MAX as u64 || threshold > u16::MAX as u64 || keycode > u8::MAX as u64 {
        return None;
    }
    Some(HostCommand::Set {
        channel: channel as u16,
        threshold: threshold as u16,
        keycode: keycode as u8,
    })
}

fn expect_byte(bytes: &[u8], i: usize, expected: u8) -> Option<usize> {
    if bytes.get(i) == Some(&expected) {
        Some(i + 1)
    } else {
        None
    }
}

fn parse_u64_ascii(bytes: &[u8], mut i: usize) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value
            .checked_mul(10)?
            .checked_add((bytes[i] - b'0') as u64)?;
        i += 1;
    }
    if i == start {
        None
    } else {
        Some((value, i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_handshake_commands() {
        assert_eq!(parse_host_command(b"CONNECT"), Some(HostCommand::Connect));
        assert_eq!(
            parse_host_command(b"DISCONNECT"),
            Some(HostCommand::Disconnect)
        );
    }

    #[test]
    fn handshake_is_case_sensitive() {
        assert_eq!(parse_host_command(b"connect"), None);
        assert_eq!(parse_host_command(b"Connect"), None);
    }

    #[test]
    fn handshake_matches_exact_bytes_only() {
        // No leniency for stray padding; the reader strips only terminators.
        assert_eq!(parse_host_command(b" CONNECT"), None);
        assert_eq!(parse_host_command(b"CONNECT "), None);
        assert_eq!(parse_host_command(b"CONNECTX"), None);
    }

    #[test]
    fn parses_set_command() {
        assert_eq!(
            parse_host_command(b"SET:5,1000,4"),
            Some(HostCommand::Set {
                channel: 5,
                threshold: 1000,
                keycode: 4,
            })
        );
    }

    #[test]
    fn set_passes_out_of_range_channel_through() {
        // The keymap store ignores it; the wire format itself is valid.
        assert_eq!(
            parse_host_command(b"SET:20,100,5"),
            Some(HostCommand::Set {
                channel: 20,
                threshold: 100,
                keycode: 5,
            })
        );
    }

    #[test]
    fn rejects_malformed_set_lines() {
        assert_eq!(parse_host_command(b"SET:"), None);
        assert_eq!(parse_host_command(b"SET:1,2"), None);
        assert_eq!(parse_host_command(b"SET:1,2,3,4"), None);
        assert_eq!(parse_host_command(b"SET:a,2,3"), None);
        assert_eq!(parse_host_command(b"SET:1,2,3 trailing"), None);
        assert_eq!(parse_host_command(b"SET:1,70000,3"), None);
        assert_eq!(parse_host_command(b"SET:1,2,300"), None);
    }

    #[test]
    fn ignores_unknown_lines() {
        assert_eq!(parse_host_command(b"PING"), None);
        assert_eq!(parse_host_command(b""), None);
        assert_eq!(parse_host_command(b"GET:1"), None);
    }
}
