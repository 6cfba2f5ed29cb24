//! Display descriptors for the closed status/category code sets.
//!
//! Lookups by raw code fail loudly on unknown input so callers can tell
//! malformed data apart from a valid code.

use std::str::FromStr;

use db::models::{
    pet::{HealthStatus, Species},
    schedule::ExamStatus,
};
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumString};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StatusKind {
    /// `tinhTrang` on pets
    #[strum(serialize = "tinh-trang")]
    HealthStatus,
    /// `trangThai` on schedules
    #[strum(serialize = "trang-thai")]
    ExamStatus,
    /// `loai` on pets
    #[strum(serialize = "loai")]
    Species,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDescriptor {
    pub code: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub class_name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code: {code:?}")]
pub struct UnknownStatusCode {
    pub kind: StatusKind,
    pub code: String,
}

const fn descriptor(
    code: &'static str,
    label: &'static str,
    icon: &'static str,
    class_name: &'static str,
) -> StatusDescriptor {
    StatusDescriptor {
        code,
        label,
        icon,
        class_name,
    }
}

pub fn health_status(status: HealthStatus) -> StatusDescriptor {
    match status {
        HealthStatus::KhoeManh => descriptor(
            "khoe_manh",
            "Khỏe mạnh",
            "💚",
            "bg-green-100 text-green-800",
        ),
        HealthStatus::DangDieuTri => descriptor(
            "dang_dieu_tri",
            "Đang điều trị",
            "💊",
            "bg-yellow-100 text-yellow-800",
        ),
        HealthStatus::TheoDoi => descriptor(
            "theo_doi",
            "Theo dõi",
            "👀",
            "bg-blue-100 text-blue-800",
        ),
        HealthStatus::NguyKich => descriptor(
            "nguy_kich",
            "Nguy kịch",
            "🚨",
            "bg-red-100 text-red-800",
        ),
        HealthStatus::DaKhoi => descriptor(
            "da_khoi",
            "Đã khỏi",
            "✅",
            "bg-emerald-100 text-emerald-800",
        ),
    }
}

pub fn exam_status(status: ExamStatus) -> StatusDescriptor {
    match status {
        ExamStatus::DaLenLich => descriptor(
            "da_len_lich",
            "Đã lên lịch",
            "📅",
            "bg-blue-100 text-blue-800",
        ),
        ExamStatus::DaKham => descriptor(
            "da_kham",
            "Đã khám",
            "✔️",
            "bg-green-100 text-green-800",
        ),
        ExamStatus::CanTaiKham => descriptor(
            "can_tai_kham",
            "Cần tái khám",
            "🔁",
            "bg-orange-100 text-orange-800",
        ),
        ExamStatus::DaHuy => descriptor(
            "da_huy",
            "Đã hủy",
            "✖️",
            "bg-gray-100 text-gray-600",
        ),
    }
}

pub fn species(species: Species) -> StatusDescriptor {
    match species {
        Species::Cho => descriptor("cho", "Chó", "🐕", "bg-amber-100 text-amber-800"),
        Species::Meo => descriptor("meo", "Mèo", "🐈", "bg-purple-100 text-purple-800"),
        Species::Chim => descriptor("chim", "Chim", "🐦", "bg-sky-100 text-sky-800"),
        Species::Tho => descriptor("tho", "Thỏ", "🐇", "bg-pink-100 text-pink-800"),
        Species::Khac => descriptor("khac", "Khác", "🐾", "bg-gray-100 text-gray-800"),
    }
}

/// Descriptor for a raw code, or an error naming the kind and the bad code.
pub fn describe(kind: StatusKind, code: &str) -> Result<StatusDescriptor, UnknownStatusCode> {
    let unknown = || UnknownStatusCode {
        kind,
        code: code.to_string(),
    };
    match kind {
        StatusKind::HealthStatus => HealthStatus::from_str(code)
            .map(health_status)
            .map_err(|_| unknown()),
        StatusKind::ExamStatus => ExamStatus::from_str(code)
            .map(exam_status)
            .map_err(|_| unknown()),
        StatusKind::Species => Species::from_str(code).map(species).map_err(|_| unknown()),
    }
}

pub fn is_valid(kind: StatusKind, code: &str) -> bool {
    describe(kind, code).is_ok()
}

/// Every descriptor of a kind, in declaration order.
pub fn all(kind: StatusKind) -> Vec<StatusDescriptor> {
    match kind {
        StatusKind::HealthStatus => HealthStatus::iter().map(health_status).collect(),
        StatusKind::ExamStatus => ExamStatus::iter().map(exam_status).collect(),
        StatusKind::Species => Species::iter().map(species).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_codes_match_stored_codes() {
        for status in HealthStatus::iter() {
            assert_eq!(health_status(status).code, status.to_string());
        }
        for status in ExamStatus::iter() {
            assert_eq!(exam_status(status).code, status.to_string());
        }
        for s in Species::iter() {
            assert_eq!(species(s).code, s.to_string());
        }
    }

    #[test]
    fn describe_known_code() {
        let d = describe(StatusKind::HealthStatus, "nguy_kich").unwrap();
        assert_eq!(d.label, "Nguy kịch");
        assert_eq!(d.class_name, "bg-red-100 text-red-800");
    }

    #[test]
    fn unknown_codes_are_flagged_not_defaulted() {
        let err = describe(StatusKind::ExamStatus, "pending").unwrap_err();
        assert_eq!(err.kind, StatusKind::ExamStatus);
        assert_eq!(err.code, "pending");
        assert_eq!(err.to_string(), "unknown trang-thai code: \"pending\"");
        assert!(!is_valid(StatusKind::Species, "Cho"));
        assert!(is_valid(StatusKind::Species, "cho"));
    }

    #[test]
    fn all_lists_every_variant() {
        assert_eq!(all(StatusKind::HealthStatus).len(), 5);
        assert_eq!(all(StatusKind::ExamStatus).len(), 4);
        assert_eq!(all(StatusKind::Species).len(), 5);
    }

    #[test]
    fn kinds_parse_from_path_segments() {
        assert_eq!(StatusKind::from_str("tinh-trang").unwrap(), StatusKind::HealthStatus);
        assert_eq!(StatusKind::from_str("loai").unwrap(), StatusKind::Species);
        assert!(StatusKind::from_str("health").is_err());
    }
}
