//! Refinement projectors and the factory that decodes them.
//!
//! The file stores each projector as a type name plus a body of numbers whose
//! layout depends on the type. Decoding is looked up by type name in a
//! [`ProjectorFactory`]; callers may register their own types.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ProjectionError;
use crate::math::{Point3, Vector3};
use crate::reader::tokens::TokenStream;

/// A geometric rule used to place new vertices during refinement.
pub trait RefinementProjector: fmt::Debug + Send + Sync {
    /// Type name under which the projector is stored.
    fn type_name(&self) -> &str;

    /// Parameters in file order.
    fn parameters(&self) -> Vec<f64>;
}

/// Decodes a projector body.
pub type DecodeFn = fn(&str) -> Result<Box<dyn RefinementProjector>, ProjectionError>;

/// Linear interpolation between parent vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearProjector;

impl RefinementProjector for LinearProjector {
    fn type_name(&self) -> &str {
        "RefinementProjector"
    }

    fn parameters(&self) -> Vec<f64> {
        Vec::new()
    }
}

/// Projects onto a sphere around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereProjector {
    pub center: Point3,
    pub radius: f64,
    /// Vertices farther than this from the center are left unprojected; a
    /// negative value disables the limit.
    pub influence_radius: f64,
}

impl RefinementProjector for SphereProjector {
    fn type_name(&self) -> &str {
        "SphereProjector"
    }

    fn parameters(&self) -> Vec<f64> {
        vec![
            self.center.x,
            self.center.y,
            self.center.z,
            self.radius,
            self.influence_radius,
        ]
    }
}

/// Projects onto a cylinder through `center` along `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderProjector {
    pub center: Point3,
    pub axis: Vector3,
    pub radius: f64,
    pub influence_radius: f64,
}

impl RefinementProjector for CylinderProjector {
    fn type_name(&self) -> &str {
        "CylinderProjector"
    }

    fn parameters(&self) -> Vec<f64> {
        vec![
            self.center.x,
            self.center.y,
            self.center.z,
            self.axis.x,
            self.axis.y,
            self.axis.z,
            self.radius,
            self.influence_radius,
        ]
    }
}

/// Places new vertices of edges crossing a plane onto that plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneCutProjector {
    pub position: Point3,
    pub normal: Vector3,
}

impl RefinementProjector for PlaneCutProjector {
    fn type_name(&self) -> &str {
        "PlaneCutProjector"
    }

    fn parameters(&self) -> Vec<f64> {
        vec![
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
        ]
    }
}

/// Reads exactly `N` leading numbers of `body`.
fn read_params<const N: usize>(type_name: &str, body: &str) -> Result<[f64; N], ProjectionError> {
    let mut tokens = TokenStream::new(body);
    let mut params = [0.0; N];
    for (found, slot) in params.iter_mut().enumerate() {
        *slot = tokens.next_f64().ok_or_else(|| ProjectionError::BadParameters {
            type_name: type_name.to_owned(),
            expected: N,
            found,
        })?;
    }
    Ok(params)
}

fn decode_linear(_body: &str) -> Result<Box<dyn RefinementProjector>, ProjectionError> {
    Ok(Box::new(LinearProjector))
}

fn decode_sphere(body: &str) -> Result<Box<dyn RefinementProjector>, ProjectionError> {
    let [x, y, z, radius, influence_radius] = read_params::<5>("SphereProjector", body)?;
    Ok(Box::new(SphereProjector {
        center: Point3::new(x, y, z),
        radius,
        influence_radius,
    }))
}

fn decode_cylinder(body: &str) -> Result<Box<dyn RefinementProjector>, ProjectionError> {
    let [x, y, z, ax, ay, az, radius, influence_radius] =
        read_params::<8>("CylinderProjector", body)?;
    Ok(Box::new(CylinderProjector {
        center: Point3::new(x, y, z),
        axis: Vector3::new(ax, ay, az),
        radius,
        influence_radius,
    }))
}

fn decode_plane_cut(body: &str) -> Result<Box<dyn RefinementProjector>, ProjectionError> {
    let [x, y, z, nx, ny, nz] = read_params::<6>("PlaneCutProjector", body)?;
    Ok(Box::new(PlaneCutProjector {
        position: Point3::new(x, y, z),
        normal: Vector3::new(nx, ny, nz),
    }))
}

/// Maps projector type names to decoders.
#[derive(Clone)]
pub struct ProjectorFactory {
    decoders: HashMap<String, DecodeFn>,
}

impl fmt::Debug for ProjectorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.decoders.keys().collect();
        names.sort();
        f.debug_struct("ProjectorFactory")
            .field("types", &names)
            .finish()
    }
}

impl Default for ProjectorFactory {
    fn default() -> Self {
        let mut factory = Self {
            decoders: HashMap::new(),
        };
        factory.register("RefinementProjector", decode_linear);
        factory.register("SphereProjector", decode_sphere);
        factory.register("CylinderProjector", decode_cylinder);
        factory.register("PlaneCutProjector", decode_plane_cut);
        factory
    }
}

impl ProjectorFactory {
    /// Creates a factory that knows the built-in projector types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `decode` under `type_name`, replacing an earlier decoder.
    pub fn register(&mut self, type_name: impl Into<String>, decode: DecodeFn) {
        self.decoders.insert(type_name.into(), decode);
    }

    /// Decodes a projector of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::UnknownType`] for unregistered type names,
    /// or the decoder's error for a malformed body.
    pub fn create(
        &self,
        type_name: &str,
        body: &str,
    ) -> Result<Box<dyn RefinementProjector>, ProjectionError> {
        let decode = self
            .decoders
            .get(type_name)
            .ok_or_else(|| ProjectionError::UnknownType(type_name.to_owned()))?;
        decode(body)
    }
}

/// Projectors of a grid, keyed by subset index.
#[derive(Debug, Default)]
pub struct ProjectionHandler {
    /// Index of the subset handler whose subsets the keys refer to.
    pub subset_handler_index: usize,
    default: Option<Box<dyn RefinementProjector>>,
    projectors: BTreeMap<usize, Box<dyn RefinementProjector>>,
}

impl ProjectionHandler {
    #[must_use]
    pub fn new(subset_handler_index: usize) -> Self {
        Self {
            subset_handler_index,
            ..Self::default()
        }
    }

    pub fn set_default_projector(&mut self, projector: Box<dyn RefinementProjector>) {
        self.default = Some(projector);
    }

    pub fn set_projector(&mut self, subset: usize, projector: Box<dyn RefinementProjector>) {
        self.projectors.insert(subset, projector);
    }

    #[must_use]
    pub fn default_projector(&self) -> Option<&dyn RefinementProjector> {
        self.default.as_deref()
    }

    /// Projector registered for exactly `subset`.
    #[must_use]
    pub fn projector(&self, subset: usize) -> Option<&dyn RefinementProjector> {
        self.projectors.get(&subset).map(|p| &**p)
    }

    /// Projector used for `subset`: its own one, else the default.
    #[must_use]
    pub fn projector_for(&self, subset: usize) -> Option<&dyn RefinementProjector> {
        self.projector(subset).or_else(|| self.default_projector())
    }

    /// Subset-specific projectors ordered by subset index.
    pub fn projectors(&self) -> impl Iterator<Item = (usize, &dyn RefinementProjector)> + '_ {
        self.projectors.iter().map(|(&s, p)| (s, &**p))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_builtin_cylinder() {
        let factory = ProjectorFactory::new();
        let p = factory
            .create("CylinderProjector", "0 0 0  0 0 1  2.5 -1")
            .unwrap();
        assert_eq!(p.type_name(), "CylinderProjector");
        assert_eq!(p.parameters(), vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.5, -1.0]);
    }

    #[test]
    fn unknown_type_is_reported() {
        let err = ProjectorFactory::new().create("TorusProjector", "").unwrap_err();
        assert!(matches!(err, ProjectionError::UnknownType(name) if name == "TorusProjector"));
    }

    #[test]
    fn short_body_is_reported() {
        let err = ProjectorFactory::new()
            .create("SphereProjector", "1 2 3")
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::BadParameters { expected: 5, found: 3, .. }
        ));
    }

    #[test]
    fn custom_decoders_can_be_registered() {
        fn decode(_: &str) -> Result<Box<dyn RefinementProjector>, ProjectionError> {
            Ok(Box::new(LinearProjector))
        }
        let mut factory = ProjectorFactory::new();
        factory.register("SmoothProjector", decode);
        assert!(factory.create("SmoothProjector", "").is_ok());
    }

    #[test]
    fn subset_projector_falls_back_to_default() {
        let mut ph = ProjectionHandler::new(0);
        ph.set_default_projector(Box::new(LinearProjector));
        ph.set_projector(
            2,
            Box::new(SphereProjector {
                center: Point3::origin(),
                radius: 1.0,
                influence_radius: -1.0,
            }),
        );
        assert_eq!(ph.projector_for(2).unwrap().type_name(), "SphereProjector");
        assert_eq!(ph.projector_for(1).unwrap().type_name(), "RefinementProjector");
        assert!(ph.projector(1).is_none());
    }
}
