/// Activates and deactivates named mixer paths.
///
/// Called with the device lock held, only for simple routes and only on the
/// 0 → 1 and 1 → 0 reference-count transitions. Implementations must not
/// fail: a mixer that cannot apply a path leaves the device unrecoverable
/// anyway, so failures are theirs to log.
pub trait PathApplier: Send {
    /// Apply every control setting of the named path.
    fn apply(&mut self, route_name: &str);

    /// Restore the controls touched by the named path.
    fn unapply(&mut self, route_name: &str);
}
