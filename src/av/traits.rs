//! Producer and sink capabilities
//!
//! The relay never parses or writes a container itself. Anything that can
//! yield a header and packets is a [`Demuxer`]; anything that accepts a
//! header, packets and a trailer is a [`Muxer`].

use async_trait::async_trait;

use crate::error::Result;

use super::{CodecData, Packet};

/// Source of one live stream
#[async_trait]
pub trait Demuxer: Send {
    /// Format header, one entry per track
    async fn streams(&mut self) -> Result<Vec<CodecData>>;

    /// Next packet, or `Ok(None)` on clean end of stream
    async fn read_packet(&mut self) -> Result<Option<Packet>>;

    /// Release the source
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Destination for one live stream
///
/// Writes arrive in the order header, packets, trailer. Any write may fail;
/// a failing sink is detached from the stream without affecting others.
#[async_trait]
pub trait Muxer: Send {
    async fn write_header(&mut self, streams: &[CodecData]) -> Result<()>;

    async fn write_packet(&mut self, packet: &Packet) -> Result<()>;

    async fn write_trailer(&mut self) -> Result<()>;

    /// Release the destination
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<D: Demuxer + ?Sized> Demuxer for Box<D> {
    async fn streams(&mut self) -> Result<Vec<CodecData>> {
        (**self).streams().await
    }

    async fn read_packet(&mut self) -> Result<Option<Packet>> {
        (**self).read_packet().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<M: Muxer + ?Sized> Muxer for Box<M> {
    async fn write_header(&mut self, streams: &[CodecData]) -> Result<()> {
        (**self).write_header(streams).await
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        (**self).write_packet(packet).await
    }

    async fn write_trailer(&mut self) -> Result<()> {
        (**self).write_trailer().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}
