use crate::models::error::RouteError;
use crate::routing::catalog::Direction;
use crate::routing::profiles::PcmProfile;

/// Opens hardware PCM endpoints.
///
/// The routing engine never touches sample data; streams use this seam to
/// open one endpoint per PCM profile covering their devices once they leave
/// standby.
pub trait PcmTransport: Send + Sync {
    fn open(
        &self,
        profile: &PcmProfile,
        direction: Direction,
    ) -> Result<Box<dyn PcmEndpoint>, RouteError>;
}

/// An open PCM endpoint. Dropping it closes the endpoint.
///
/// Reads and writes block for at most one period.
pub trait PcmEndpoint: Send {
    fn write(&mut self, data: &[u8]) -> Result<(), RouteError>;

    fn read(&mut self, data: &mut [u8]) -> Result<(), RouteError>;
}
