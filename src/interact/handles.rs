use crate::foundation::core::{Point, Rect, rect_xywh};

/// Resize handle identifiers. Side handles exist only on text assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    MiddleLeft,
    MiddleRight,
}

impl Handle {
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    pub fn is_side(self) -> bool {
        matches!(self, Handle::MiddleLeft | Handle::MiddleRight)
    }

    /// +1 when the handle sits on the right edge, -1 on the left.
    pub fn sign_x(self) -> f64 {
        match self {
            Handle::TopRight | Handle::BottomRight | Handle::MiddleRight => 1.0,
            Handle::TopLeft | Handle::BottomLeft | Handle::MiddleLeft => -1.0,
        }
    }

    /// +1 on the bottom edge, -1 on the top; side handles report +1.
    pub fn sign_y(self) -> f64 {
        match self {
            Handle::TopLeft | Handle::TopRight => -1.0,
            _ => 1.0,
        }
    }

    pub fn cursor(self) -> Cursor {
        match self {
            Handle::TopLeft | Handle::BottomRight => Cursor::NwseResize,
            Handle::TopRight | Handle::BottomLeft => Cursor::NeswResize,
            Handle::MiddleLeft | Handle::MiddleRight => Cursor::EwResize,
        }
    }
}

/// Pointer cursor the host should display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Move,
    NwseResize,
    NeswResize,
    EwResize,
}

/// Hit rectangles for the handles of `bounds`.
///
/// Corner squares of side `size` are centered on the corners. Side pills are `size` wide and
/// `2 * size` tall, centered on the vertical midpoint of each side.
pub fn handle_rects(bounds: Rect, size: f64, with_sides: bool) -> Vec<(Handle, Rect)> {
    let r = (size / 2.0).floor();
    let (x, y, w, h) = (bounds.x0, bounds.y0, bounds.width(), bounds.height());
    let mut out = vec![
        (Handle::TopLeft, rect_xywh(x - r, y - r, size, size)),
        (Handle::TopRight, rect_xywh(x + w - r, y - r, size, size)),
        (Handle::BottomLeft, rect_xywh(x - r, y + h - r, size, size)),
        (Handle::BottomRight, rect_xywh(x + w - r, y + h - r, size, size)),
    ];
    if with_sides {
        let mid = y + (h / 2.0).round();
        out.push((Handle::MiddleLeft, rect_xywh(x - r, mid - size, size, size * 2.0)));
        out.push((Handle::MiddleRight, rect_xywh(x + w - r, mid - size, size, size * 2.0)));
    }
    out
}

/// First handle whose rectangle contains `p`, edges inclusive.
pub fn handle_at(bounds: Rect, size: f64, with_sides: bool, p: Point) -> Option<Handle> {
    handle_rects(bounds, size, with_sides)
        .into_iter()
        .find(|(_, r)| p.x >= r.x0 && p.y >= r.y0 && p.x <= r.x1 && p.y <= r.y1)
        .map(|(h, _)| h)
}
