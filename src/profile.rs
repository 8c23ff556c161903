/// Longitudinal profile of a flow path.
///
/// Projects the inverts (and crowns of closed sections) of every link from
/// a starting link down to the end of its chain onto a running distance,
/// for plotting. Read-only with respect to the network.

use serde::Serialize;

use crate::links::LinkKind;
use crate::model::HydraulicResult;
use crate::network::{LinkId, Network};

/// Horizontal length drawn for a weir, in feet.
pub const WEIR_DISPLAY_LENGTH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSegment {
    pub link: LinkId,
    /// Distance along the path at the upstream end.
    pub start: f64,
    pub end: f64,
    /// Invert at `start` and `end`.
    pub invert: (f64, f64),
    /// Crown at `start` and `end`, for closed sections.
    pub crown: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub segments: Vec<ProfileSegment>,
}

impl Profile {
    pub fn length(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }

    /// `(distance, elevation)` vertices of the invert line.
    pub fn invert_line(&self) -> Vec<(f64, f64)> {
        self.segments
            .iter()
            .flat_map(|s| [(s.start, s.invert.0), (s.end, s.invert.1)])
            .collect()
    }

    /// Crown vertices; open segments break the line and are skipped.
    pub fn crown_line(&self) -> Vec<(f64, f64)> {
        self.segments
            .iter()
            .filter_map(|s| s.crown.map(|c| [(s.start, c.0), (s.end, c.1)]))
            .flatten()
            .collect()
    }
}

/// Profile from the upstream end of `link` down its chain.
pub fn profile(network: &Network, link: LinkId) -> HydraulicResult<Profile> {
    let start = network.link(link)?.node_1();
    let mut distance = 0.0;
    let mut segments = Vec::new();
    for id in network.links_down_from_node(start) {
        let (length, invert, rise) = match &network.link(id)?.kind {
            LinkKind::Reach(reach) => (
                reach.length,
                (reach.invert_1, reach.invert_2),
                reach.section.rise().ok(),
            ),
            LinkKind::Weir(weir) => (
                WEIR_DISPLAY_LENGTH,
                (weir.invert, weir.invert),
                weir.section.rise().ok(),
            ),
        };
        segments.push(ProfileSegment {
            link: id,
            start: distance,
            end: distance + length,
            invert,
            crown: rise.map(|r| (invert.0 + r, invert.1 + r)),
        });
        distance += length;
    }
    Ok(Profile { segments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Section;
    use std::sync::Arc;

    #[test]
    fn test_profile_of_pipe_weir_and_channel() {
        let mut net = Network::new();
        let a = net.create_node();
        let b = net.create_node();
        let c = net.create_node();
        let d = net.create_node();
        let pipe = Arc::new(Section::circle(2.0).unwrap().with_roughness(0.013).unwrap());
        let ditch = Arc::new(Section::trapezoid(3.0, 2.0, 3.0).unwrap().with_roughness(0.03).unwrap());
        let p = net.create_reach(a, b, 10.0, 9.0, 100.0, pipe.clone()).unwrap();
        let w = net.create_weir(b, c, 8.5, 0.6, 3.2, pipe).unwrap();
        let ch = net.create_reach(c, d, 8.0, 7.5, 50.0, ditch).unwrap();

        let profile = profile(&net, p).unwrap();
        let links: Vec<LinkId> = profile.segments.iter().map(|s| s.link).collect();
        assert_eq!(links, vec![p, w, ch]);
        assert_eq!(profile.length(), 160.0);
        assert_eq!(
            profile.invert_line(),
            vec![
                (0.0, 10.0),
                (100.0, 9.0),
                (100.0, 8.5),
                (110.0, 8.5),
                (110.0, 8.0),
                (160.0, 7.5)
            ]
        );
        assert_eq!(profile.crown_line().len(), 4, "open channel has no crown");
        assert_eq!(profile.segments[0].crown, Some((12.0, 11.0)));
    }

    #[test]
    fn test_profile_starts_mid_network() {
        let mut net = Network::new();
        let a = net.create_node();
        let b = net.create_node();
        let c = net.create_node();
        let pipe = Arc::new(Section::circle(1.0).unwrap().with_roughness(0.013).unwrap());
        net.create_reach(a, b, 5.0, 4.0, 40.0, pipe.clone()).unwrap();
        let lower = net.create_reach(b, c, 4.0, 3.0, 60.0, pipe).unwrap();
        let profile = profile(&net, lower).unwrap();
        assert_eq!(profile.segments.len(), 1);
        assert_eq!(profile.length(), 60.0);
    }
}
