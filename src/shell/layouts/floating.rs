// SPDX-License-Identifier: GPL-3.0-only

//! `arrange` is a no-op: client-chosen positions are preserved.

use crate::shell::layout::{Layout, LayoutRequest};

pub struct Floating;

impl Layout for Floating {
    fn name(&self) -> &'static str {
        "floating"
    }

    fn symbol(&self) -> &'static str {
        "><>"
    }

    fn arrange(&self, _req: &mut LayoutRequest) {}

    fn focus_next(&self, count: usize, current: usize, direction: i32) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let len = count as i32;
        Some((current as i32 + direction).rem_euclid(len) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::layout::{Gaps, LayoutClient};
    use smithay::utils::{Point, Rectangle, Size};

    #[test]
    fn arrange_leaves_client_positions_untouched() {
        let original = Rectangle::new(Point::from((42, 17)), Size::from((300, 200)));
        let mut clients = vec![LayoutClient { rect: original, column_ratio: 0.0 }];
        let mut req = LayoutRequest {
            area: Rectangle::new(Point::from((0, 0)), Size::from((1920, 1080))),
            gaps: Gaps::default(),
            master_factor: 0.5,
            nmaster: 1,
            focused_index: Some(0),
            clients: &mut clients,
        };
        Floating.arrange(&mut req);
        assert_eq!(clients[0].rect, original);
    }
}
