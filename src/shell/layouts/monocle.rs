// SPDX-License-Identifier: GPL-3.0-only

//! Every client fills the entire gapped usable area, stacked in z-order.

use crate::shell::layout::{Layout, LayoutRequest};
use smithay::utils::{Point, Rectangle, Size};

pub struct Monocle;

impl Layout for Monocle {
    fn name(&self) -> &'static str {
        "monocle"
    }

    fn symbol(&self) -> &'static str {
        "[M]"
    }

    fn arrange(&self, req: &mut LayoutRequest) {
        let area = req.area;
        let gaps = req.gaps;
        let rect = Rectangle::new(
            Point::from((area.loc.x + gaps.outer_h, area.loc.y + gaps.outer_v)),
            Size::from((area.size.w - 2 * gaps.outer_h, area.size.h - 2 * gaps.outer_v)),
        );
        for client in req.clients.iter_mut() {
            client.rect = rect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::layout::{Gaps, LayoutClient};

    #[test]
    fn every_client_gets_the_same_full_area() {
        let mut clients = vec![
            LayoutClient { rect: Rectangle::from_size(Size::from((0, 0))), column_ratio: 0.0 },
            LayoutClient { rect: Rectangle::from_size(Size::from((0, 0))), column_ratio: 0.0 },
        ];
        let mut req = LayoutRequest {
            area: Rectangle::new(Point::from((0, 0)), Size::from((1920, 1080))),
            gaps: Gaps { outer_h: 10, outer_v: 10, ..Default::default() },
            master_factor: 0.5,
            nmaster: 1,
            focused_index: None,
            clients: &mut clients,
        };
        Monocle.arrange(&mut req);
        assert_eq!(clients[0].rect, clients[1].rect);
        assert_eq!(clients[0].rect.size.w, 1900);
    }
}
