use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use proptest::strategy::Strategy;
use undine_geom::{Aabb, Vec3};

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vapprox(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx(a.x, b.x, eps) && approx(a.y, b.y, eps) && approx(a.z, b.z, eps)
}

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e5)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn small_positive() -> impl Strategy<Value = f32> {
    0.1f32..64.0
}

fn arb_size() -> impl Strategy<Value = Vec3> {
    (small_positive(), small_positive(), small_positive()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    // a + b == b + a (element-wise)
    #[test]
    fn add_commutative(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(vapprox(a + b, b + a, 1e-4));
    }

    // a - a is the zero vector
    #[test]
    fn sub_self_is_zero(a in arb_vec3()) {
        prop_assert!(vapprox(a - a, Vec3::ZERO, 0.0));
    }

    // cross product is orthogonal to both inputs, up to rounding that
    // scales with the operand magnitudes
    #[test]
    fn cross_orthogonal(a in arb_vec3(), b in arb_vec3()) {
        let c = a.cross(b);
        let la = a.length();
        let lb = b.length();
        prop_assert!(c.dot(a).abs() <= la * la * lb * 1e-5 + 1e-3);
        prop_assert!(c.dot(b).abs() <= la * lb * lb * 1e-5 + 1e-3);
    }

    // negation flips dot sign
    #[test]
    fn neg_flips_dot(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(approx((-a).dot(b), -(a.dot(b)), a.length() * b.length() * 1e-4 + 1e-3));
    }

    // a box built from origin + size contains its own center
    #[test]
    fn aabb_contains_center(origin in arb_vec3(), size in arb_size()) {
        let bb = Aabb::from_origin_size(origin, size);
        prop_assert!(bb.contains(bb.center()));
        prop_assert!(vapprox(bb.size(), size, 1e-2));
    }
}

#[test]
fn normalized_unit_length() {
    let v = Vec3::new(3.0, -4.0, 12.0).normalized();
    assert!((v.length() - 1.0).abs() < 1e-6);
    assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
}

#[test]
fn up_is_unit_y() {
    assert_eq!(Vec3::UP, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(Vec3::UP.length(), 1.0);
}
