//! Collaborator interfaces the sampler is driven through.

/// The dynamics engine that owns the live microstate.
///
/// The sampler only ever holds independent copies of the state (`Snapshot`),
/// so a rejected trial can always be rolled back to the last accepted one.
pub trait HostEngine {
    type Snapshot: Clone;

    /// Copy of the full live microstate.
    fn snapshot(&self) -> Self::Snapshot;
    /// Overwrite the live microstate.
    fn restore(&mut self, snapshot: &Self::Snapshot);
    /// Potential energy of the live microstate.
    fn potential_energy(&self) -> f64;
    /// Resample momenta from the Maxwell-Boltzmann distribution at `kt`.
    fn thermalize_momenta(&mut self, kt: f64);
    /// Propagate the live state by one timestep of ordinary dynamics.
    fn step(&mut self);
}

/// A scalar function of the microstate.
pub trait CollectiveVariable<S> {
    fn evaluate(&self, snapshot: &S) -> f64;
}

impl<S, F> CollectiveVariable<S> for F
where
    F: Fn(&S) -> f64,
{
    fn evaluate(&self, snapshot: &S) -> f64 {
        self(snapshot)
    }
}
