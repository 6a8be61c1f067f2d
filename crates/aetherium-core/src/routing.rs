//! Edge routing for transitions.
//!
//! Every transition is drawn as one cubic Bézier segment between two anchors
//! on the boundaries of its state nodes. The shape of that segment comes from
//! the transition's shape hints, checked in this order:
//!
//! 1. self-loops always get the loop curve,
//! 2. an explicit control point bends the curve through that point,
//! 3. a scalar path offset pushes the curve sideways off the chord,
//! 4. unshaped members of a bidirectional pair get an automatic separation,
//! 5. everything else is a plain curve between the anchors.
//!
//! All functions here are pure.

use kurbo::{BezPath, CubicBez, ParamCurve, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Side of a node an edge leaves from or arrives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Unit vector pointing out of the node through this side.
    pub fn outward(self) -> Vec2 {
        match self {
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Right => Vec2::new(1.0, 0.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
            Side::Left => Vec2::new(-1.0, 0.0),
        }
    }

    /// Unit vector along this side.
    pub fn tangent(self) -> Vec2 {
        let n = self.outward();
        Vec2::new(-n.y, n.x)
    }

    /// Midpoint of this side of `rect`.
    pub fn anchor_on(self, rect: Rect) -> Point {
        let center = rect.center();
        match self {
            Side::Top => Point::new(center.x, rect.y0),
            Side::Right => Point::new(rect.x1, center.y),
            Side::Bottom => Point::new(center.x, rect.y1),
            Side::Left => Point::new(rect.x0, center.y),
        }
    }

    /// Sides facing each other for a source at `source` and a target at
    /// `target`, chosen by the dominant axis of the centre delta.
    pub fn facing(source: Rect, target: Rect) -> (Side, Side) {
        let delta = target.center() - source.center();
        if delta.x.abs() >= delta.y.abs() {
            if delta.x >= 0.0 {
                (Side::Right, Side::Left)
            } else {
                (Side::Left, Side::Right)
            }
        } else if delta.y >= 0.0 {
            (Side::Bottom, Side::Top)
        } else {
            (Side::Top, Side::Bottom)
        }
    }
}

/// An edge endpoint together with its approach direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub point: Point,
    pub side: Side,
}

impl Anchor {
    pub fn new(point: Point, side: Side) -> Self {
        Self { point, side }
    }

    pub fn on(rect: Rect, side: Side) -> Self {
        Self::new(side.anchor_on(rect), side)
    }
}

/// Tuning constants for the router.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Size of the self-loop curve.
    pub loop_size: f64,
    /// Where the self-loop label sits, as a fraction of `loop_size` out from
    /// the anchor.
    pub loop_label_factor: f64,
    /// Length of the default control arms as a fraction of the chord length.
    pub control_distance: f64,
    /// Automatic offset magnitude for bidirectional pairs.
    pub bidirectional_offset: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            loop_size: 60.0,
            loop_label_factor: 0.6,
            control_distance: 0.25,
            bidirectional_offset: 45.0,
        }
    }
}

/// Resolved shape request for a non-loop edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeHint {
    /// No hint: plain curve between the anchors.
    Straight,
    /// Displacement along the edge's own chord normal.
    Offset(f64),
    /// Curve constrained through this point.
    ControlPoint(Point),
    /// Automatic separation of a bidirectional pair. The offset is applied
    /// along the normal of the chord oriented from the smaller state id to
    /// the larger one; `reversed` is set when this edge runs the other way.
    Separation { offset: f64, reversed: bool },
}

/// Which branch produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    SelfLoop,
    ControlPoint,
    Offset,
    Separated,
    Straight,
}

/// A routed edge: the curve to draw and where its label goes.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub curve: CubicBez,
    pub label: Point,
    pub kind: RouteKind,
    /// Displacement along the edge's own chord normal. Zero for self-loops.
    pub normal_offset: f64,
}

impl Route {
    pub fn path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.curve.p0);
        path.curve_to(self.curve.p1, self.curve.p2, self.curve.p3);
        path
    }

    /// SVG path data for the curve.
    pub fn to_svg(&self) -> String {
        self.path().to_svg()
    }

    /// Tangent direction at the end of the curve, for arrowheads.
    pub fn end_direction(&self) -> Vec2 {
        let d = self.curve.p3 - self.curve.p2;
        let len = d.hypot();
        if len < f64::EPSILON {
            let chord = self.curve.p3 - self.curve.p0;
            let chord_len = chord.hypot();
            if chord_len < f64::EPSILON {
                Vec2::new(0.0, 1.0)
            } else {
                chord / chord_len
            }
        } else {
            d / len
        }
    }
}

/// Everything needed to route one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    pub source_id: String,
    pub target_id: String,
    pub source: Anchor,
    pub target: Anchor,
    pub control_point: Option<Point>,
    pub path_offset: Option<f64>,
    pub has_reverse_sibling: bool,
}

impl EdgeGeometry {
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }

    /// Resolve the stored hints into a single shape request.
    pub fn hint(&self, config: &RoutingConfig) -> ShapeHint {
        if let Some(point) = self.control_point {
            ShapeHint::ControlPoint(point)
        } else if let Some(offset) = self.path_offset {
            ShapeHint::Offset(offset)
        } else if self.has_reverse_sibling {
            ShapeHint::Separation {
                offset: default_bidirectional_offset(
                    &self.source_id,
                    &self.target_id,
                    config.bidirectional_offset,
                ),
                reversed: self.source_id > self.target_id,
            }
        } else {
            ShapeHint::Straight
        }
    }
}

/// Automatic offset for an unshaped member of a bidirectional pair:
/// negative when `source_id` sorts after `target_id`.
pub fn default_bidirectional_offset(source_id: &str, target_id: &str, magnitude: f64) -> f64 {
    if source_id > target_id {
        -magnitude
    } else {
        magnitude
    }
}

/// Route a transition, self-loops first.
pub fn route_edge(geometry: &EdgeGeometry, config: &RoutingConfig) -> Route {
    if geometry.is_self_loop() {
        route_self_loop(geometry.source, config)
    } else {
        route(geometry.source, geometry.target, geometry.hint(config), config)
    }
}

/// Route a non-loop edge between two anchors.
pub fn route(source: Anchor, target: Anchor, hint: ShapeHint, config: &RoutingConfig) -> Route {
    match hint {
        ShapeHint::ControlPoint(point) => through_control_point(source.point, target.point, point),
        ShapeHint::Offset(offset) => {
            offset_route(source, target, offset, config, RouteKind::Offset)
        }
        ShapeHint::Separation { offset, reversed } => {
            let own = if reversed { -offset } else { offset };
            offset_route(source, target, own, config, RouteKind::Separated)
        }
        ShapeHint::Straight => offset_route(source, target, 0.0, config, RouteKind::Straight),
    }
}

/// Loop leaving and re-entering the same anchor.
pub fn route_self_loop(anchor: Anchor, config: &RoutingConfig) -> Route {
    let size = config.loop_size;
    let out = anchor.side.outward() * size;
    let across = anchor.side.tangent() * (size / 2.0);
    let curve = CubicBez::new(
        anchor.point,
        anchor.point + out - across,
        anchor.point + out + across,
        anchor.point,
    );
    Route {
        curve,
        label: anchor.point + anchor.side.outward() * (size * config.loop_label_factor),
        kind: RouteKind::SelfLoop,
        normal_offset: 0.0,
    }
}

/// Unit normal of the chord from `source` to `target`, `None` when the two
/// points coincide.
pub fn chord_normal(source: Point, target: Point) -> Option<Vec2> {
    let chord = target - source;
    let len = chord.hypot();
    if len < f64::EPSILON {
        None
    } else {
        Some(Vec2::new(-chord.y, chord.x) / len)
    }
}

/// Signed distance of `point` from the chord midpoint along the chord normal.
pub fn offset_of(source: Point, target: Point, point: Point) -> f64 {
    match chord_normal(source, target) {
        Some(normal) => (point - source.midpoint(target)).dot(normal),
        None => 0.0,
    }
}

/// Quadratic through `control`, elevated to a cubic.
fn through_control_point(source: Point, target: Point, control: Point) -> Route {
    let curve = CubicBez::new(
        source,
        source.lerp(control, 2.0 / 3.0),
        target.lerp(control, 2.0 / 3.0),
        target,
    );
    Route {
        curve,
        label: control,
        kind: RouteKind::ControlPoint,
        normal_offset: offset_of(source, target, control),
    }
}

fn offset_route(
    source: Anchor,
    target: Anchor,
    offset: f64,
    config: &RoutingConfig,
    kind: RouteKind,
) -> Route {
    let reach = (target.point - source.point).hypot() * config.control_distance;
    let mut c1 = source.point + source.side.outward() * reach;
    let mut c2 = target.point + target.side.outward() * reach;
    // Coincident endpoints have no normal; keep the default controls
    if let Some(normal) = chord_normal(source.point, target.point) {
        let shift = normal * offset;
        c1 += shift;
        c2 += shift;
    }
    let curve = CubicBez::new(source.point, c1, c2, target.point);
    Route {
        curve,
        label: curve.eval(0.5),
        kind,
        normal_offset: offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal() -> (Anchor, Anchor) {
        (
            Anchor::new(Point::new(0.0, 0.0), Side::Right),
            Anchor::new(Point::new(100.0, 0.0), Side::Left),
        )
    }

    fn geometry(source_id: &str, target_id: &str) -> EdgeGeometry {
        let (source, target) = horizontal();
        EdgeGeometry {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            source,
            target,
            control_point: None,
            path_offset: None,
            has_reverse_sibling: false,
        }
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_route_is_deterministic() {
        let (s, t) = horizontal();
        let config = RoutingConfig::default();
        let a = route(s, t, ShapeHint::Offset(12.5), &config);
        let b = route(s, t, ShapeHint::Offset(12.5), &config);
        assert_eq!(a, b);
        assert_eq!(a.to_svg(), b.to_svg());
    }

    #[test]
    fn test_straight_route_is_on_chord() {
        let (s, t) = horizontal();
        let r = route(s, t, ShapeHint::Straight, &RoutingConfig::default());
        assert_eq!(r.kind, RouteKind::Straight);
        assert!(close(r.label, Point::new(50.0, 0.0)));
        assert!(close(r.curve.p1, Point::new(25.0, 0.0)));
        assert!(close(r.curve.p2, Point::new(75.0, 0.0)));
    }

    #[test]
    fn test_offset_displaces_controls_along_normal() {
        let (s, t) = horizontal();
        let r = route(s, t, ShapeHint::Offset(30.0), &RoutingConfig::default());
        // Chord (0,0)->(100,0) has normal (0,1)
        assert!(close(r.curve.p1, Point::new(25.0, 30.0)));
        assert!(close(r.curve.p2, Point::new(75.0, 30.0)));
        // Bernstein midpoint: 0.375 * 30 + 0.375 * 30
        assert!(close(r.label, Point::new(50.0, 22.5)));
        assert!((r.normal_offset - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_control_point_route() {
        let (s, t) = horizontal();
        let c = Point::new(40.0, -60.0);
        let r = route(s, t, ShapeHint::ControlPoint(c), &RoutingConfig::default());
        assert_eq!(r.kind, RouteKind::ControlPoint);
        assert_eq!(r.label, c);
        assert!(close(r.curve.p1, Point::new(80.0 / 3.0, -40.0)));
        assert!(close(r.curve.p2, Point::new(100.0 + (40.0 - 100.0) * 2.0 / 3.0, -40.0)));
        assert!((r.normal_offset + 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_control_point_wins_over_offset() {
        let mut g = geometry("a", "b");
        g.path_offset = Some(30.0);
        g.control_point = Some(Point::new(50.0, 80.0));
        let r = route_edge(&g, &RoutingConfig::default());
        assert_eq!(r.kind, RouteKind::ControlPoint);
        assert_eq!(r.label, Point::new(50.0, 80.0));
    }

    #[test]
    fn test_self_loop_ignores_hints() {
        let config = RoutingConfig::default();
        let anchor = Anchor::new(Point::new(50.0, 0.0), Side::Top);
        let mut g = geometry("s1", "s1");
        g.source = anchor;
        g.target = anchor;
        g.control_point = Some(Point::new(500.0, 500.0));
        g.path_offset = Some(99.0);
        g.has_reverse_sibling = true;

        let r = route_edge(&g, &config);
        assert_eq!(r.kind, RouteKind::SelfLoop);
        assert_eq!(r.curve.p0, anchor.point);
        assert_eq!(r.curve.p3, anchor.point);
        // Controls sit above the top side, spread along it
        assert!(close(r.curve.p1, Point::new(20.0, -60.0)));
        assert!(close(r.curve.p2, Point::new(80.0, -60.0)));
        assert!(close(r.label, Point::new(50.0, -36.0)));
    }

    #[test]
    fn test_bidirectional_offsets_are_opposite() {
        let config = RoutingConfig::default();
        let forward = default_bidirectional_offset("s1", "s2", config.bidirectional_offset);
        let backward = default_bidirectional_offset("s2", "s1", config.bidirectional_offset);
        assert!((forward - 45.0).abs() < f64::EPSILON);
        assert!((backward + 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bidirectional_pair_separates() {
        let config = RoutingConfig::default();
        let mut t1 = geometry("s1", "s2");
        t1.has_reverse_sibling = true;
        let mut t2 = geometry("s2", "s1");
        t2.has_reverse_sibling = true;
        std::mem::swap(&mut t2.source, &mut t2.target);
        t2.source.side = Side::Left;
        t2.target.side = Side::Right;

        assert_eq!(
            t1.hint(&config),
            ShapeHint::Separation {
                offset: 45.0,
                reversed: false
            }
        );
        assert_eq!(
            t2.hint(&config),
            ShapeHint::Separation {
                offset: -45.0,
                reversed: true
            }
        );

        let r1 = route_edge(&t1, &config);
        let r2 = route_edge(&t2, &config);
        assert_eq!(r1.kind, RouteKind::Separated);
        // Labels land on opposite sides of the shared chord
        assert!(r1.label.y > 0.0);
        assert!(r2.label.y < 0.0);
        assert!((r1.label.y + r2.label.y).abs() < 1e-9);
    }

    #[test]
    fn test_unshaped_without_sibling_is_straight() {
        let r = route_edge(&geometry("a", "b"), &RoutingConfig::default());
        assert_eq!(r.kind, RouteKind::Straight);
    }

    #[test]
    fn test_coincident_endpoints_do_not_produce_nan() {
        let p = Point::new(10.0, 10.0);
        let r = route(
            Anchor::new(p, Side::Right),
            Anchor::new(p, Side::Left),
            ShapeHint::Offset(40.0),
            &RoutingConfig::default(),
        );
        assert!(r.label.x.is_finite() && r.label.y.is_finite());
        assert_eq!(r.label, p);
        assert!(r.end_direction().x.is_finite());
    }

    #[test]
    fn test_facing_sides() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let right = Rect::new(300.0, 0.0, 400.0, 50.0);
        let below = Rect::new(0.0, 300.0, 100.0, 350.0);
        assert_eq!(Side::facing(a, right), (Side::Right, Side::Left));
        assert_eq!(Side::facing(right, a), (Side::Left, Side::Right));
        assert_eq!(Side::facing(a, below), (Side::Bottom, Side::Top));
        assert_eq!(Side::facing(below, a), (Side::Top, Side::Bottom));
        assert_eq!(Anchor::on(a, Side::Right).point, Point::new(100.0, 25.0));
    }

    #[test]
    fn test_offset_of_matches_normal() {
        let s = Point::new(0.0, 0.0);
        let t = Point::new(100.0, 0.0);
        assert!((offset_of(s, t, Point::new(50.0, 20.0)) - 20.0).abs() < 1e-9);
        assert!((offset_of(t, s, Point::new(50.0, 20.0)) + 20.0).abs() < 1e-9);
        assert_eq!(offset_of(s, s, Point::new(1.0, 1.0)), 0.0);
    }
}
