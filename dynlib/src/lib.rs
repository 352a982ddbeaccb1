use std::error;
use std::ffi::{CStr, CString, c_void};
use std::fmt;
use std::mem::transmute_copy;
use std::ptr::NonNull;

use libc::{dlclose, dlerror, dlopen, dlsym};

#[derive(Debug)]
pub enum Error {
    Open { filename: CString, reason: String },
    Lookup { symbol: CString, reason: String },
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { filename, reason } => {
                f.write_fmt(format_args!("could not open {filename:?}: {reason}"))
            }
            Self::Lookup { symbol, reason } => {
                f.write_fmt(format_args!("could not look up {symbol:?}: {reason}"))
            }
        }
    }
}

// NOTE: dlerror hands out a buffer owned by libc; copy it out, never free it.
fn take_dlerror() -> Option<String> {
    let err = unsafe { dlerror() };
    if err.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned())
    }
}

pub struct DynLib(NonNull<c_void>);

impl DynLib {
    pub fn open(filename: &CStr) -> Result<Self, Error> {
        let handle = unsafe { dlopen(filename.as_ptr(), libc::RTLD_LAZY) };
        match NonNull::new(handle) {
            Some(handle) => Ok(Self(handle)),
            None => Err(Error::Open {
                filename: filename.to_owned(),
                reason: take_dlerror().unwrap_or_else(|| "unknown dlopen failure".to_string()),
            }),
        }
    }

    /// tries each filename in order; handy for soname fallbacks
    /// (`libEGL.so.1`, then `libEGL.so`).
    pub fn open_any(filenames: &[&CStr]) -> Result<Self, Error> {
        assert!(!filenames.is_empty());

        let mut last_err = None;
        for filename in filenames {
            match Self::open(filename) {
                Ok(lib) => return Ok(lib),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.expect("at least one filename was tried"))
    }

    pub fn lookup<F: Sized>(&self, symbol: &CStr) -> Result<F, Error> {
        unsafe {
            // clear any stale error so the post-dlsym check is meaningful.
            _ = dlerror();

            let addr = dlsym(self.0.as_ptr(), symbol.as_ptr());

            if let Some(reason) = take_dlerror() {
                Err(Error::Lookup {
                    symbol: symbol.to_owned(),
                    reason,
                })
            } else {
                Ok(transmute_copy(&addr))
            }
        }
    }
}

impl Drop for DynLib {
    fn drop(&mut self) {
        unsafe {
            dlclose(self.0.as_ptr());
        }
    }
}

#[macro_export]
macro_rules! opaque_struct {
    ($name:ident) => {
        #[repr(C)]
        pub struct $name {
            _data: [u8; 0],
            _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
        }
    };
}

#[test]
fn test_open_and_lookup_libc() {
    let lib = DynLib::open_any(&[c"libc.so.6", c"libc.so"]).expect("could not open libc");

    let strlen = lib
        .lookup::<unsafe extern "C" fn(s: *const std::ffi::c_char) -> usize>(c"strlen")
        .expect("could not look up strlen");
    assert_eq!(unsafe { strlen(c"four".as_ptr()) }, 4);

    assert!(lib.lookup::<*mut c_void>(c"definitely_not_a_symbol").is_err());
}
