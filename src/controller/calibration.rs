//! Best-effort repair of a controller's internal look state.
//!
//! Controllers name their yaw/pitch/target state differently, so reconciliation
//! fires at every conventional member name. Each candidate is probed for
//! existence and exact shape before the write; failed writes are dropped.
//! None of these functions can fail or panic.

use glam::{Quat, Vec2, Vec3};

use super::reflect::{Introspect, Shape, Value};
use crate::utils::euler_degrees;

enum Target {
    Method(&'static str, Args),
    Property(&'static str, Arg),
    Field(&'static str, Arg),
}

#[derive(Clone, Copy)]
enum Args {
    YawPitch,
    Rotation,
}

#[derive(Clone, Copy)]
enum Arg {
    Yaw,
    Pitch,
    Zero,
    YawPitch,
    Euler,
    Rotation,
}

const FULL: &[Target] = &[
    Target::Method("SetYawPitch", Args::YawPitch),
    Target::Method("SetAngles", Args::YawPitch),
    Target::Method("SnapToRotation", Args::Rotation),
    Target::Method("SetRotation", Args::Rotation),
    Target::Method("SetLookAngles", Args::YawPitch),
    Target::Property("Yaw", Arg::Yaw),
    Target::Property("Pitch", Arg::Pitch),
    Target::Property("YawPitch", Arg::YawPitch),
    Target::Property("Angles", Arg::YawPitch),
    Target::Property("Rotation", Arg::Rotation),
    Target::Property("TargetRotation", Arg::Rotation),
    Target::Field("yaw", Arg::Yaw),
    Target::Field("m_Yaw", Arg::Yaw),
    Target::Field("pitch", Arg::Pitch),
    Target::Field("m_Pitch", Arg::Pitch),
    // smoothed targets, so the controller does not drift after it resumes
    Target::Field("tyaw", Arg::Yaw),
    Target::Field("tpitch", Arg::Pitch),
    Target::Field("troll", Arg::Zero),
    Target::Field("look", Arg::YawPitch),
    Target::Field("lookAngles", Arg::YawPitch),
    Target::Field("angles", Arg::YawPitch),
    Target::Field("rotationEuler", Arg::Euler),
    Target::Field("m_RotationEuler", Arg::Euler),
    Target::Field("targetRotation", Arg::Rotation),
    Target::Field("m_TargetRotation", Arg::Rotation),
    Target::Field("desiredRotation", Arg::Rotation),
    Target::Field("m_DesiredRotation", Arg::Rotation),
];

const YAW_PITCH_ONLY: &[Target] = &[
    Target::Method("SetYawPitch", Args::YawPitch),
    Target::Method("SnapToRotation", Args::Rotation),
    Target::Property("Yaw", Arg::Yaw),
    Target::Property("Pitch", Arg::Pitch),
    Target::Field("yaw", Arg::Yaw),
    Target::Field("pitch", Arg::Pitch),
];

struct Look {
    yaw: f32,
    pitch: f32,
    euler: Vec3,
    rotation: Quat,
}

impl Look {
    fn new(rotation: Quat) -> Self {
        let rotation = rotation.normalize();
        let (pitch, yaw, roll) = euler_degrees(rotation);
        Self { yaw, pitch, euler: Vec3::new(pitch, yaw, roll), rotation }
    }

    fn arg(&self, arg: Arg) -> Value {
        match arg {
            Arg::Yaw => Value::Float(self.yaw),
            Arg::Pitch => Value::Float(self.pitch),
            Arg::Zero => Value::Float(0.0),
            Arg::YawPitch => Value::Vec2(Vec2::new(self.yaw, self.pitch)),
            Arg::Euler => Value::Vec3(self.euler),
            Arg::Rotation => Value::Quat(self.rotation),
        }
    }

    fn args(&self, args: Args) -> Vec<Value> {
        match args {
            Args::YawPitch => vec![Value::Float(self.yaw), Value::Float(self.pitch)],
            Args::Rotation => vec![Value::Quat(self.rotation)],
        }
    }
}

fn same_shapes(params: &[Shape], args: &[Value]) -> bool {
    params.len() == args.len() && params.iter().zip(args).all(|(p, a)| *p == a.shape())
}

fn apply<C: Introspect + ?Sized>(controller: &mut C, look: &Look, targets: &[Target]) {
    for target in targets {
        let outcome = match target {
            Target::Method(name, args) => {
                let args = look.args(*args);
                match controller.method(name) {
                    Some(params) if same_shapes(&params, &args) => controller.invoke(name, &args),
                    _ => continue,
                }
            }
            Target::Property(name, arg) => {
                let value = look.arg(*arg);
                match controller.property(name) {
                    Some(info) if info.writable && info.shape == value.shape() => controller.set_property(name, value),
                    _ => continue,
                }
            }
            Target::Field(name, arg) => {
                let value = look.arg(*arg);
                match controller.field_shape(name) {
                    Some(shape) if shape == value.shape() => controller.set_field(name, value),
                    _ => continue,
                }
            }
        };
        if let Err(e) = outcome {
            tracing::trace!(error = %e, "look-state write dropped");
        }
    }
}

/// Write every compatible look-state member so the controller agrees with `target_rotation`.
pub fn reconcile<C: Introspect + ?Sized>(controller: &mut C, target_rotation: Quat) {
    apply(controller, &Look::new(target_rotation), FULL);
}

/// Narrow variant: only yaw/pitch setters and fields.
pub fn reconcile_yaw_pitch<C: Introspect + ?Sized>(controller: &mut C, target_rotation: Quat) {
    apply(controller, &Look::new(target_rotation), YAW_PITCH_ONLY);
}

/// Zero every vector field whose name suggests velocity, so paused momentum does not resume.
pub fn zero_velocity_like_fields<C: Introspect + ?Sized>(controller: &mut C) {
    for name in controller.field_names() {
        let lower = name.to_lowercase();
        if !(lower.contains("velocity") || lower.contains("vel") || lower.contains("angular")) {
            continue;
        }
        if controller.field_shape(&name) != Some(Shape::Vec3) {
            continue;
        }
        if let Err(e) = controller.set_field(&name, Value::zero(Shape::Vec3)) {
            tracing::trace!(field = %name, error = %e, "velocity reset dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reflect::{PropertyBag, ReflectError};
    use crate::utils::from_euler_degrees;
    use approx::assert_abs_diff_eq;

    fn float(bag: &PropertyBag, name: &str) -> f32 {
        bag.field(name).and_then(|v| v.as_float()).unwrap()
    }

    #[test]
    fn writes_every_matching_name() {
        let mut bag = PropertyBag::new()
            .with_field("yaw", Value::Float(0.0))
            .with_field("m_Yaw", Value::Float(0.0))
            .with_field("tpitch", Value::Float(5.0))
            .with_field("troll", Value::Float(40.0))
            .with_field("desiredRotation", Value::Quat(Quat::IDENTITY))
            .with_property("Angles", Value::Vec2(Vec2::ZERO), true)
            .with_method("SetYawPitch", &[Shape::Float, Shape::Float]);

        let rot = from_euler_degrees(-25.0, 120.0, 0.0);
        reconcile(&mut bag, rot);

        assert_abs_diff_eq!(float(&bag, "yaw"), 120.0, epsilon = 1e-3);
        assert_abs_diff_eq!(float(&bag, "m_Yaw"), 120.0, epsilon = 1e-3);
        assert_abs_diff_eq!(float(&bag, "tpitch"), -25.0, epsilon = 1e-3);
        assert_eq!(float(&bag, "troll"), 0.0);
        let desired = bag.field("desiredRotation").and_then(|v| v.as_quat()).unwrap();
        assert!(desired.dot(rot).abs() > 0.9999);
        match bag.property_value("Angles") {
            Some(Value::Vec2(v)) => {
                assert_abs_diff_eq!(v.x, 120.0, epsilon = 1e-3);
                assert_abs_diff_eq!(v.y, -25.0, epsilon = 1e-3);
            }
            other => panic!("Angles not written: {other:?}"),
        }
        assert_eq!(bag.calls().len(), 1, "SetYawPitch should be invoked once");
    }

    #[test]
    fn skips_wrong_shapes_and_read_only_members() {
        let mut bag = PropertyBag::new()
            .with_field("yaw", Value::Vec3(Vec3::ONE))
            .with_property("Rotation", Value::Quat(Quat::IDENTITY), false)
            .with_method("SetRotation", &[Shape::Float]);

        reconcile(&mut bag, from_euler_degrees(0.0, 90.0, 0.0));

        assert_eq!(bag.field("yaw"), Some(Value::Vec3(Vec3::ONE)));
        assert_eq!(bag.property_value("Rotation"), Some(Value::Quat(Quat::IDENTITY)));
        assert!(bag.calls().is_empty());
    }

    struct Grumpy {
        tyaw: f32,
        attempts: usize,
    }

    impl Introspect for Grumpy {
        fn field_shape(&self, name: &str) -> Option<Shape> {
            matches!(name, "yaw" | "tyaw").then_some(Shape::Float)
        }

        fn set_field(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
            self.attempts += 1;
            match name {
                "tyaw" => {
                    self.tyaw = value.as_float().unwrap_or_default();
                    Ok(())
                }
                _ => Err(ReflectError::Rejected { name: name.into(), reason: "locked".into() }),
            }
        }
    }

    #[test]
    fn failed_write_does_not_stop_later_targets() {
        let mut c = Grumpy { tyaw: 0.0, attempts: 0 };
        reconcile(&mut c, from_euler_degrees(0.0, 45.0, 0.0));
        assert_eq!(c.attempts, 2);
        assert_abs_diff_eq!(c.tyaw, 45.0, epsilon = 1e-3);
    }

    #[test]
    fn yaw_pitch_variant_leaves_targets_alone() {
        let mut bag = PropertyBag::new()
            .with_field("yaw", Value::Float(0.0))
            .with_field("tyaw", Value::Float(7.0));
        reconcile_yaw_pitch(&mut bag, from_euler_degrees(0.0, -60.0, 0.0));
        assert_abs_diff_eq!(float(&bag, "yaw"), -60.0, epsilon = 1e-3);
        assert_eq!(float(&bag, "tyaw"), 7.0);
    }

    #[test]
    fn zeroes_only_velocity_like_vectors() {
        let mut bag = PropertyBag::new()
            .with_field("m_Velocity", Value::Vec3(Vec3::ONE))
            .with_field("angularDrift", Value::Vec3(Vec3::ONE))
            .with_field("vel", Value::Float(3.0))
            .with_field("offset", Value::Vec3(Vec3::ONE));
        zero_velocity_like_fields(&mut bag);
        assert_eq!(bag.field("m_Velocity"), Some(Value::Vec3(Vec3::ZERO)));
        assert_eq!(bag.field("angularDrift"), Some(Value::Vec3(Vec3::ZERO)));
        assert_eq!(bag.field("vel"), Some(Value::Float(3.0)), "scalars are not velocity vectors");
        assert_eq!(bag.field("offset"), Some(Value::Vec3(Vec3::ONE)));
    }
}
