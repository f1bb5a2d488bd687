//! Prepared stored-procedure calls.

use crate::binding::{self, BindSlot};
use crate::driver::{Driver, DriverStatement};
use crate::error::{classify_execution, Error, Result};
use crate::value::Value;

/// A prepared stored-procedure call.
///
/// Lifecycle is prepare, execute, retrieve, close. The driver-side callable
/// resource is exclusively owned by this value and must be released with
/// [`close`](DbCall::close) (idempotent); dropping without closing leaks the
/// driver resource.
///
/// ```
/// use simple_oracle::mock::MockDriver;
/// use simple_oracle::{BindSlot, BindType, DbCall, Value};
///
/// # fn main() -> simple_oracle::Result<()> {
/// let mut db = MockDriver::new();
/// db.define_procedure("begin :out := :in; end;", |slots| {
///     Ok(vec![slots.get(1).cloned().flatten(), None])
/// });
///
/// let mut call = DbCall::prepare(&mut db, "begin :out := :in; end;")?;
/// call.execute(&mut db, vec![
///     BindSlot::Out(BindType::Varchar),
///     BindSlot::In(Value::from("ABC")),
/// ])?;
/// assert_eq!(call.get(&mut db, 1)?, Value::from("ABC"));
/// call.close()?;
/// # Ok(())
/// # }
/// ```
pub struct DbCall {
    call: Option<Box<dyn DriverStatement>>,
    binds: Vec<BindSlot>,
}

impl std::fmt::Debug for DbCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCall")
            .field("call", &self.call.as_ref().map(|_| "..."))
            .field("binds", &self.binds)
            .finish()
    }
}

impl DbCall {
    /// Prepare a callable statement from `call_text`.
    pub fn prepare(conn: &mut dyn Driver, call_text: &str) -> Result<Self> {
        Ok(Self {
            call: Some(conn.prepare_call(call_text)?),
            binds: Vec::new(),
        })
    }

    /// Prepare, bind and execute in one step. The call stays open for
    /// retrieval and must still be released with [`close`](DbCall::close).
    pub fn execute_immediate(
        conn: &mut dyn Driver,
        call_text: &str,
        binds: Vec<BindSlot>,
    ) -> Result<Self> {
        let mut this = Self::prepare(conn, call_text)?;
        this.execute(conn, binds)?;
        Ok(this)
    }

    /// Bind every slot at its 1-based position and execute the call.
    ///
    /// Driver failures are classified once, here: "no data found", "too
    /// many rows" and the `ORA-2xxxx` application range map into the error
    /// taxonomy; anything else is re-raised unchanged. Returns `&mut Self`
    /// so retrieval can be chained.
    pub fn execute(&mut self, conn: &mut dyn Driver, binds: Vec<BindSlot>) -> Result<&mut Self> {
        let call = self
            .call
            .as_mut()
            .ok_or_else(|| Error::InvalidUsage("call is closed".into()))?;
        for (i, slot) in binds.iter().enumerate() {
            binding::bind_slot(conn, call.as_mut(), slot, i + 1)?;
        }
        self.binds = binds;
        call.execute().map_err(classify_execution)?;
        Ok(self)
    }

    /// Retrieve the slot bound at a 1-based position after execution.
    ///
    /// A plain `In` scalar comes back as the original input value without a
    /// driver round trip. Typed slots (`InTyped`/`Out`/`InOut`) decode from
    /// the driver using the slot's declared type; collection, composite and
    /// ref-cursor slots decode through their own codecs.
    pub fn get(&mut self, conn: &mut dyn Driver, pos: usize) -> Result<Value> {
        if pos < 1 {
            return Err(Error::BindIndexOutOfRange(pos));
        }
        let slot = self
            .binds
            .get(pos - 1)
            .ok_or(Error::BindIndexOutOfRange(pos))?;
        let call = self
            .call
            .as_mut()
            .ok_or_else(|| Error::InvalidUsage("call is closed".into()))?;
        match slot {
            BindSlot::In(value) => Ok(value.clone()),
            BindSlot::InTyped(ty, _) | BindSlot::Out(ty) | BindSlot::InOut(ty, _) => {
                binding::retrieve_typed(conn, call.as_mut(), ty, pos)
            }
        }
    }

    /// Release the driver resource and clear bind state. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut call) = self.call.take() {
            call.close()?;
        }
        self.binds.clear();
        Ok(())
    }

    /// True until [`close`](DbCall::close) is called.
    pub fn is_open(&self) -> bool {
        self.call.is_some()
    }
}
