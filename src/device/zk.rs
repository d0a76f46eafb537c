//! Minimal driver for ZKTeco-style attendance terminals over TCP.
//!
//! Speaks just enough of the binary dialect to pause capture, download the
//! attendance log and optionally wipe it: the 40-byte record layout on port
//! 4370. UDP transports, realtime capture and the shorter legacy record
//! layouts are out of scope; terminals speaking those still work through
//! any other [`Terminal`] implementation.

use crate::config::Config;
use crate::device::{Terminal, TerminalSession};
use crate::errors::{AppError, AppResult};
use crate::models::{RawRecord, RawValue};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

const MAGIC: [u8; 4] = [0x50, 0x50, 0x82, 0x7d];

const CMD_CONNECT: u16 = 1000;
const CMD_EXIT: u16 = 1001;
const CMD_ENABLEDEVICE: u16 = 1002;
const CMD_DISABLEDEVICE: u16 = 1003;
const CMD_ACK_UNAUTH: u16 = 1005;
const CMD_PREPARE_DATA: u16 = 1500;
const CMD_DATA: u16 = 1501;
const CMD_FREE_DATA: u16 = 1502;
const CMD_ACK_OK: u16 = 2000;
const CMD_ATTLOG_RRQ: u16 = 13;
const CMD_CLEAR_ATTLOG: u16 = 15;

/// Each attendance entry on the wire: uid u16, user id (24 bytes,
/// NUL padded), status u8, seconds-since-2000 u32, punch u8, 8 bytes pad.
const RECORD_SIZE: usize = 40;

/// Upper bound on any single transfer; real logs top out in the low MBs.
const MAX_TRANSFER: usize = 32 * 1024 * 1024;

/// A terminal reachable at host:port, ready to hand out sessions.
pub struct ZkTerminal {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ZkTerminal {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.device_host.clone(),
            cfg.device_port,
            Duration::from_secs(cfg.device_timeout_secs),
        )
    }
}

impl Terminal for ZkTerminal {
    type Session = ZkSession;

    fn connect(&self) -> AppResult<ZkSession> {
        let addr = format!("{}:{}", self.host, self.port);
        let sock_addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| AppError::Device(format!("cannot resolve {addr}")))?;

        let stream = TcpStream::connect_timeout(&sock_addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut session = ZkSession {
            stream,
            session_id: 0,
            reply_id: u16::MAX - 1,
        };

        let reply = session.command(CMD_CONNECT, &[])?;
        match reply.cmd {
            CMD_ACK_OK => {
                session.session_id = reply.session;
                Ok(session)
            }
            CMD_ACK_UNAUTH => Err(AppError::Device(
                "terminal requires a communication password".to_string(),
            )),
            other => Err(AppError::Device(format!(
                "handshake refused by terminal (reply {other})"
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// An established session on a terminal.
pub struct ZkSession {
    stream: TcpStream,
    session_id: u16,
    reply_id: u16,
}

struct Reply {
    cmd: u16,
    session: u16,
    data: Vec<u8>,
}

impl ZkSession {
    fn command(&mut self, cmd: u16, data: &[u8]) -> AppResult<Reply> {
        self.reply_id = self.reply_id.wrapping_add(1);
        let packet = build_packet(cmd, self.session_id, self.reply_id, data);
        self.stream.write_all(&packet)?;
        read_reply(&mut self.stream)
    }

    fn expect_ack(&mut self, cmd: u16, data: &[u8]) -> AppResult<()> {
        let reply = self.command(cmd, data)?;
        if reply.cmd == CMD_ACK_OK {
            Ok(())
        } else {
            Err(AppError::Device(format!(
                "command {cmd} refused by terminal (reply {})",
                reply.cmd
            )))
        }
    }

    /// Collect a PREPARE_DATA / DATA stream into one buffer.
    fn receive_stream(&mut self, prepare: &[u8]) -> AppResult<Vec<u8>> {
        if prepare.len() < 4 {
            return Err(AppError::Device(
                "malformed data announcement from terminal".to_string(),
            ));
        }
        let total =
            u32::from_le_bytes([prepare[0], prepare[1], prepare[2], prepare[3]]) as usize;
        if total > MAX_TRANSFER {
            return Err(AppError::Device(format!(
                "terminal announced an implausible transfer of {total} bytes"
            )));
        }

        let mut buf = Vec::with_capacity(total);
        while buf.len() < total {
            let part = read_reply(&mut self.stream)?;
            match part.cmd {
                CMD_DATA => buf.extend_from_slice(&part.data),
                CMD_ACK_OK => break,
                other => {
                    return Err(AppError::Device(format!(
                        "unexpected packet {other} during data transfer"
                    )));
                }
            }
        }

        // Release the buffer on the far side; old firmware leaks otherwise.
        if let Err(e) = self.command(CMD_FREE_DATA, &[]) {
            log::debug!("terminal did not acknowledge FREE_DATA: {e}");
        }

        Ok(buf)
    }
}

impl TerminalSession for ZkSession {
    fn disable_capture(&mut self) -> AppResult<()> {
        self.expect_ack(CMD_DISABLEDEVICE, &[])?;
        // The capture thread on the terminal needs a moment to settle
        // before the log read or it answers with partial data.
        thread::sleep(Duration::from_millis(200));
        Ok(())
    }

    fn enable_capture(&mut self) -> AppResult<()> {
        self.expect_ack(CMD_ENABLEDEVICE, &[])
    }

    fn read_records(&mut self) -> AppResult<Vec<RawRecord>> {
        let reply = self.command(CMD_ATTLOG_RRQ, &[])?;
        let data = match reply.cmd {
            // Small logs arrive inline with the acknowledgement.
            CMD_ACK_OK => reply.data,
            CMD_PREPARE_DATA => self.receive_stream(&reply.data)?,
            other => {
                return Err(AppError::Device(format!(
                    "attendance read refused by terminal (reply {other})"
                )));
            }
        };
        Ok(parse_attendance(&data))
    }

    fn clear_log(&mut self) -> AppResult<()> {
        self.expect_ack(CMD_CLEAR_ATTLOG, &[])
    }

    fn close(&mut self) -> AppResult<()> {
        self.expect_ack(CMD_EXIT, &[])
    }
}

/// Frame one command packet: magic, payload length, then the payload of
/// command word, checksum, session id, reply id and data.
fn build_packet(cmd: u16, session: u16, reply: u16, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(8 + data.len());
    payload.extend_from_slice(&cmd.to_le_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&session.to_le_bytes());
    payload.extend_from_slice(&reply.to_le_bytes());
    payload.extend_from_slice(data);

    let ck = checksum(&payload);
    payload[2..4].copy_from_slice(&ck.to_le_bytes());

    let mut packet = Vec::with_capacity(8 + payload.len());
    packet.extend_from_slice(&MAGIC);
    packet.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    packet.extend_from_slice(&payload);
    packet
}

fn read_reply(stream: &mut TcpStream) -> AppResult<Reply> {
    let mut header = [0u8; 8];
    stream.read_exact(&mut header)?;

    if header[0..4] != MAGIC {
        return Err(AppError::Device(
            "unexpected framing from terminal".to_string(),
        ));
    }

    let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len < 8 {
        return Err(AppError::Device(format!(
            "short reply from terminal ({len} bytes)"
        )));
    }
    if len > MAX_TRANSFER {
        return Err(AppError::Device(format!(
            "oversized reply from terminal ({len} bytes)"
        )));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload)?;

    Ok(Reply {
        cmd: u16::from_le_bytes([payload[0], payload[1]]),
        session: u16::from_le_bytes([payload[4], payload[5]]),
        data: payload[8..].to_vec(),
    })
}

/// Ones' complement word checksum as the firmware computes it, including
/// its fold at 0xFFFF. The checksum field itself must be zeroed first.
pub fn checksum(payload: &[u8]) -> u16 {
    let mut sum: i64 = 0;
    let mut chunks = payload.chunks_exact(2);
    for c in chunks.by_ref() {
        sum += u16::from_le_bytes([c[0], c[1]]) as i64;
        if sum > 0xFFFF {
            sum -= 0xFFFF;
        }
    }
    if let [last] = chunks.remainder() {
        sum += *last as i64;
    }
    while sum > 0xFFFF {
        sum -= 0xFFFF;
    }

    let mut ck = !sum;
    while ck < 0 {
        ck += 0xFFFF;
    }
    ck as u16
}

/// Decode the terminal's packed timestamp: seconds counted since 2000 in a
/// calendar where every month has 31 days. Out-of-range dates (the padding
/// months have fewer real days) come back as None.
pub fn decode_time(mut t: u32) -> Option<NaiveDateTime> {
    let second = t % 60;
    t /= 60;
    let minute = t % 60;
    t /= 60;
    let hour = t % 24;
    t /= 24;
    let day = t % 31 + 1;
    t /= 31;
    let month = t % 12 + 1;
    t /= 12;
    let year = 2000 + t;

    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}

/// Parse one 40-byte attendance entry into a raw record.
///
/// The user id field is dropped when blank; the numeric uid remains as the
/// fallback identifier. Entries with an undecodable timestamp are dropped.
pub fn parse_record(entry: &[u8]) -> Option<RawRecord> {
    if entry.len() < RECORD_SIZE {
        return None;
    }

    let uid = u16::from_le_bytes([entry[0], entry[1]]);
    let user_id: String = entry[2..26]
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect();
    let status = entry[26];
    let raw_time = u32::from_le_bytes([entry[27], entry[28], entry[29], entry[30]]);
    let punch = entry[31];

    let time = match decode_time(raw_time) {
        Some(t) => t,
        None => {
            log::warn!("dropping record with undecodable timestamp {raw_time}");
            return None;
        }
    };

    let mut record = RawRecord::new()
        .with("uid", RawValue::Int(uid as i64))
        .with("status", RawValue::Int(status as i64))
        .with("punch", RawValue::Int(punch as i64))
        .with("timestamp", RawValue::Time(time));

    let user_id = user_id.trim();
    if !user_id.is_empty() {
        record.set("user_id", RawValue::Text(user_id.to_string()));
    }

    Some(record)
}

/// Split a downloaded attendance blob into records.
///
/// The blob starts with a 4-byte total size, then packed 40-byte entries.
pub fn parse_attendance(data: &[u8]) -> Vec<RawRecord> {
    if data.len() < 4 {
        return Vec::new();
    }
    let body = &data[4..];

    if body.len() % RECORD_SIZE != 0 {
        log::warn!(
            "attendance blob has {} trailing bytes, discarding the batch",
            body.len() % RECORD_SIZE
        );
        return Vec::new();
    }

    body.chunks_exact(RECORD_SIZE)
        .filter_map(parse_record)
        .collect()
}
