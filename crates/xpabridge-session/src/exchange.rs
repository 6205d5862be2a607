//! Moving arrays and container files through a session.

use xpabridge_marshal::{ArrayBuffer, ByteOrder, ContainerCodec, ElementKind, MarshalError};
use xpabridge_transport::Transport;

use crate::{Outbound, Session, SessionError};

/// Command that transfers a raw array.
const ARRAY_COMMAND: &str = "array";

/// Command that transfers a whole FITS file.
const CONTAINER_COMMAND: &str = "fits";

impl<T: Transport> Session<T> {
    /// Reads the displayed image as an array.
    ///
    /// Asks for `fits width`, `fits height`, `fits depth` and
    /// `fits bitpix`, then fetches the raw `array` data. The result is
    /// `[height, width]`, or `[depth, height, width]` for a cube, in host
    /// byte order. An empty depth reply counts as 1.
    pub async fn get_array(&mut self) -> Result<ArrayBuffer, SessionError> {
        let width = self.query_number("fits width").await?;
        let height = self.query_number("fits height").await?;
        let depth = match self.get_text("fits depth").await?.trim() {
            "" => 1,
            value => parse_number("fits depth", value)?,
        };
        let bitpix = self.query_number("fits bitpix").await?;
        let data = self.get_bytes(ARRAY_COMMAND).await?;

        let marshaller = &self.config().marshaller;
        let params = marshaller.describe(
            usize::try_from(width).map_err(|_| invalid("fits width", width))?,
            usize::try_from(height).map_err(|_| invalid("fits height", height))?,
            usize::try_from(depth).map_err(|_| invalid("fits depth", depth))?,
            i32::try_from(bitpix).map_err(|_| invalid("fits bitpix", bitpix))?,
            ByteOrder::Native,
        );
        tracing::debug!(id = %self.id(), %params, bytes = data.len(), "read array");
        Ok(marshaller.decode(&params, &data)?)
    }

    /// Displays `array` on the target.
    ///
    /// With `target` the array is converted to that kind first; otherwise
    /// the marshaller's widening policy applies. Returns 1 if the target
    /// was reached, 0 if not.
    ///
    /// # Errors
    /// [`SessionError::Marshal`] if the final element kind has no bitpix.
    pub async fn set_array(
        &mut self,
        array: &ArrayBuffer,
        target: Option<ElementKind>,
    ) -> Result<usize, SessionError> {
        let encoded = self.config().marshaller.encode(array, target)?;
        let command = encoded.command();
        self.set(&command, Outbound::Bytes(&encoded.data), Some(encoded.data.len()))
            .await
    }

    /// Fetches the displayed file and decodes it with `codec`.
    pub async fn get_container<C: ContainerCodec>(
        &mut self,
        codec: &C,
    ) -> Result<C::Document, SessionError> {
        let bytes = self.get_bytes(CONTAINER_COMMAND).await?;
        Ok(codec.decode(&bytes)?)
    }

    /// Encodes `document` with `codec` and sends it for display.
    ///
    /// Returns 1 if the target was reached, 0 if not. An invalid document
    /// fails before anything is sent.
    pub async fn set_container<C: ContainerCodec>(
        &mut self,
        codec: &C,
        document: &C::Document,
    ) -> Result<usize, SessionError> {
        let bytes = codec.encode(document)?;
        self.set(CONTAINER_COMMAND, Outbound::Bytes(&bytes), Some(bytes.len()))
            .await
    }

    async fn query_number(&mut self, params: &str) -> Result<i64, SessionError> {
        let text = self.get_text(params).await?;
        Ok(parse_number(params, text.trim())?)
    }
}

fn parse_number(field: &str, value: &str) -> Result<i64, MarshalError> {
    value.parse().map_err(|_| MarshalError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn invalid(field: &str, value: i64) -> MarshalError {
    MarshalError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    }
}
