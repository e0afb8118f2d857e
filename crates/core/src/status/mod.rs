//! Read-only status snapshot
//!
//! Collected by the cooperative loop and rendered by the status page. The
//! report is a plain copy, so rendering never touches the shared frame.

use core::fmt;

use crate::channels::{ChannelFrame, CHANNEL_COUNT};
use crate::failsafe::LinkState;
use crate::shared::ControlLink;

/// Point-in-time view of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub link_state: LinkState,
    pub session_active: bool,
    /// Valid control payloads received
    pub accepted: u32,
    /// Malformed control payloads dropped
    pub rejected: u32,
    /// Failsafe engagements
    pub trips: u32,
    /// Completed PPM frames
    pub frames: u32,
    /// Shared frame as currently published (unclamped)
    pub channels: ChannelFrame,
}

impl StatusReport {
    /// Capture receive counters and the shared frame from `link`
    pub fn capture(
        link: &ControlLink,
        link_state: LinkState,
        trips: u32,
        session_active: bool,
        frames: u32,
    ) -> Self {
        Self {
            link_state,
            session_active,
            accepted: link.stats().accepted(),
            rejected: link.stats().rejected(),
            trips,
            frames,
            channels: link.frame().snapshot(),
        }
    }

    /// Write the report as a small HTML page
    pub fn render<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let link = match self.link_state {
            LinkState::Linked => "linked",
            LinkState::Failsafe => "failsafe",
        };
        let session = if self.session_active { "yes" } else { "no" };

        write!(out, "<!DOCTYPE html><html><head><title>rc-bridge</title></head><body>")?;
        write!(out, "<h1>rc-bridge</h1><table>")?;
        write!(out, "<tr><td>Session active</td><td>{}</td></tr>", session)?;
        write!(out, "<tr><td>Control link</td><td>{}</td></tr>", link)?;
        write!(out, "<tr><td>Frames accepted</td><td>{}</td></tr>", self.accepted)?;
        write!(out, "<tr><td>Frames rejected</td><td>{}</td></tr>", self.rejected)?;
        write!(out, "<tr><td>Failsafe trips</td><td>{}</td></tr>", self.trips)?;
        write!(out, "<tr><td>PPM frames</td><td>{}</td></tr>", self.frames)?;
        write!(out, "</table><h2>Channels (µs)</h2><table>")?;
        for index in 0..CHANNEL_COUNT {
            write!(
                out,
                "<tr><td>CH{}</td><td>{}</td></tr>",
                index + 1,
                self.channels.values()[index]
            )?;
        }
        write!(out, "</table></body></html>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;
    use crate::receiver::{FrameReceiver, PeerId};

    type Page = heapless::String<2048>;

    #[test]
    fn test_capture_reads_link() {
        let link = ControlLink::default();
        let frame = ChannelFrame::new([1000, 1100, 1200, 1300, 1400, 1500, 1600, 1700]);
        let receiver = FrameReceiver::new(&link);
        receiver.on_receive(PeerId::default(), &encode_frame(&frame), 10);
        receiver.on_receive(PeerId::default(), &[0x00], 11);

        let report = StatusReport::capture(&link, LinkState::Linked, 2, true, 40);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.channels, frame);
        assert_eq!(report.frames, 40);
        assert_eq!(report.trips, 2);
    }

    #[test]
    fn test_render_session_flag() {
        let link = ControlLink::default();
        let mut page = Page::new();

        StatusReport::capture(&link, LinkState::Failsafe, 0, false, 0)
            .render(&mut page)
            .unwrap();
        assert!(page.contains("<td>Session active</td><td>no</td>"));
        assert!(page.contains("<td>failsafe</td>"));
        assert!(page.contains("<td>CH8</td><td>900</td>"));
    }

    #[test]
    fn test_render_linked() {
        let link = ControlLink::new(ChannelFrame::uniform(1500));
        let mut page = Page::new();

        StatusReport::capture(&link, LinkState::Linked, 1, true, 3)
            .render(&mut page)
            .unwrap();
        assert!(page.contains("<td>Session active</td><td>yes</td>"));
        assert!(page.contains("<td>CH1</td><td>1500</td>"));
        assert!(page.ends_with("</html>"));
    }
}
