use std::ptr;

use hsm_roundtrip_interfaces::{CryptoAlgorithm, ObjectClass, RsaPublicKeyMaterial};
use hsm_roundtrip_logger::{debug, warn};
use pkcs11_sys::{
    CK_ATTRIBUTE, CK_KEY_TYPE, CK_MECHANISM, CK_MECHANISM_TYPE, CK_OBJECT_CLASS,
    CK_OBJECT_HANDLE, CK_ULONG, CKA_CLASS, CKA_KEY_TYPE, CKA_LABEL, CKA_MODULUS,
    CKA_PUBLIC_EXPONENT, CKK_RSA, CKM_RSA_PKCS, CKO_PRIVATE_KEY, CKO_PUBLIC_KEY,
};
use zeroize::Zeroizing;

use crate::{HError, HResult, Session};

/// `CK_UNAVAILABLE_INFORMATION`: the attribute cannot be revealed
const UNAVAILABLE_INFORMATION: CK_ULONG = CK_ULONG::MAX;

const fn ck_object_class(object_class: ObjectClass) -> CK_OBJECT_CLASS {
    match object_class {
        ObjectClass::PublicKey => CKO_PUBLIC_KEY,
        ObjectClass::PrivateKey => CKO_PRIVATE_KEY,
    }
}

/// PKCS#11 mechanism implementing `algorithm`
pub(crate) const fn rsa_mechanism_type(algorithm: CryptoAlgorithm) -> CK_MECHANISM_TYPE {
    match algorithm {
        CryptoAlgorithm::RsaPkcsV15 => CKM_RSA_PKCS,
    }
}

impl Session {
    /// Find an RSA key of class `object_class` carrying `label`.
    ///
    /// If several objects match, the first one reported by the token is used.
    pub(crate) fn find_rsa_key(
        &self,
        label: &str,
        object_class: ObjectClass,
    ) -> HResult<CK_OBJECT_HANDLE> {
        let mut key_type: CK_KEY_TYPE = CKK_RSA;
        let mut class = ck_object_class(object_class);
        let mut template = [
            CK_ATTRIBUTE {
                type_: CKA_LABEL,
                pValue: label.as_ptr().cast::<std::ffi::c_void>().cast_mut(),
                ulValueLen: CK_ULONG::try_from(label.len())?,
            },
            CK_ATTRIBUTE {
                type_: CKA_KEY_TYPE,
                pValue: (&raw mut key_type).cast::<std::ffi::c_void>(),
                ulValueLen: CK_ULONG::try_from(size_of::<CK_KEY_TYPE>())?,
            },
            CK_ATTRIBUTE {
                type_: CKA_CLASS,
                pValue: (&raw mut class).cast::<std::ffi::c_void>(),
                ulValueLen: CK_ULONG::try_from(size_of::<CK_OBJECT_CLASS>())?,
            },
        ];
        let object_handles = self.find_object_handles(&mut template)?;
        let Some(&handle) = object_handles.first() else {
            return Err(HError::KeyNotFound(format!(
                "no RSA {object_class} labelled `{label}`"
            )));
        };
        if object_handles.len() > 1 {
            warn!(
                "{} RSA {object_class} objects are labelled `{label}`, using the first one",
                object_handles.len()
            );
        }
        debug!("RSA {object_class} `{label}`: handle {handle}");
        Ok(handle)
    }

    /// Read the modulus and public exponent of an RSA public key.
    pub(crate) fn get_rsa_public_key(
        &self,
        key_handle: CK_OBJECT_HANDLE,
    ) -> HResult<RsaPublicKeyMaterial> {
        // first call: the lengths
        let mut template = [
            CK_ATTRIBUTE {
                type_: CKA_MODULUS,
                pValue: ptr::null_mut(),
                ulValueLen: 0,
            },
            CK_ATTRIBUTE {
                type_: CKA_PUBLIC_EXPONENT,
                pValue: ptr::null_mut(),
                ulValueLen: 0,
            },
        ];
        self.call_get_attributes(key_handle, &mut template)?;
        let modulus_len = template[0].ulValueLen;
        let public_exponent_len = template[1].ulValueLen;
        if modulus_len == UNAVAILABLE_INFORMATION
            || public_exponent_len == UNAVAILABLE_INFORMATION
        {
            return Err(HError::Default(format!(
                "the public components of key handle {key_handle} are not available"
            )));
        }

        // second call: the values
        let mut modulus = vec![0_u8; usize::try_from(modulus_len)?];
        let mut public_exponent = vec![0_u8; usize::try_from(public_exponent_len)?];
        let mut template = [
            CK_ATTRIBUTE {
                type_: CKA_MODULUS,
                pValue: modulus.as_mut_ptr().cast::<std::ffi::c_void>(),
                ulValueLen: modulus_len,
            },
            CK_ATTRIBUTE {
                type_: CKA_PUBLIC_EXPONENT,
                pValue: public_exponent.as_mut_ptr().cast::<std::ffi::c_void>(),
                ulValueLen: public_exponent_len,
            },
        ];
        self.call_get_attributes(key_handle, &mut template)?;
        modulus.truncate(usize::try_from(template[0].ulValueLen)?);
        public_exponent.truncate(usize::try_from(template[1].ulValueLen)?);

        Ok(RsaPublicKeyMaterial {
            modulus,
            public_exponent,
        })
    }

    /// Decrypt with the RSA mechanism of `algorithm`.
    /// `CKM_RSA_PKCS` takes no parameters.
    pub(crate) fn decrypt_rsa(
        &self,
        key_handle: CK_OBJECT_HANDLE,
        algorithm: CryptoAlgorithm,
        ciphertext: &[u8],
    ) -> HResult<Zeroizing<Vec<u8>>> {
        let mut mechanism = CK_MECHANISM {
            mechanism: rsa_mechanism_type(algorithm),
            pParameter: ptr::null_mut(),
            ulParameterLen: 0,
        };
        self.decrypt_with_mechanism(key_handle, &mut mechanism, ciphertext)
    }
}
