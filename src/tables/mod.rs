//! Tag id constants and human-readable tag-name tables
//!
//! Three namespaces: the shared 0th/1st/Exif table, the GPS table and the
//! Interoperability table. Ids collide across namespaces, so lookups go
//! through the owning IFD kind.

use crate::core::ifd::IfdKind;

// Structural tags the codec itself reads and maintains
pub const EXIF_IFD_POINTER: u16 = 0x8769;
pub const GPS_IFD_POINTER: u16 = 0x8825;
pub const INTEROP_IFD_POINTER: u16 = 0xA005;
pub const JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;

// Frequently edited descriptive tags
pub const IMAGE_DESCRIPTION: u16 = 0x010E;
pub const MAKE: u16 = 0x010F;
pub const MODEL: u16 = 0x0110;
pub const ORIENTATION: u16 = 0x0112;
pub const SOFTWARE: u16 = 0x0131;
pub const DATE_TIME: u16 = 0x0132;
pub const ARTIST: u16 = 0x013B;
pub const MAKER_NOTE: u16 = 0x927C;
pub const USER_COMMENT: u16 = 0x9286;
pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const DATE_TIME_DIGITIZED: u16 = 0x9004;
pub const SUB_SEC_TIME: u16 = 0x9290;
pub const SUB_SEC_TIME_ORIGINAL: u16 = 0x9291;
pub const SUB_SEC_TIME_DIGITIZED: u16 = 0x9292;
pub const COMPONENTS_CONFIGURATION: u16 = 0x9101;
pub const IMAGE_UNIQUE_ID: u16 = 0xA420;
pub const CAMERA_OWNER_NAME: u16 = 0xA430;
pub const BODY_SERIAL_NUMBER: u16 = 0xA431;
pub const LENS_MAKE: u16 = 0xA433;
pub const LENS_MODEL: u16 = 0xA434;
pub const LENS_SERIAL_NUMBER: u16 = 0xA435;
pub const GPS_LATITUDE: u16 = 0x0002;

/// A tag id and its display name
#[derive(Debug, Clone, Copy)]
pub struct TagDef {
    pub id: u16,
    pub name: &'static str,
}

/// Names shared by the 0th, 1st and Exif IFDs
pub const IMAGE_TAGS: &[TagDef] = &[
    TagDef { id: 0x0100, name: "ImageWidth" },
    TagDef { id: 0x0101, name: "ImageLength" },
    TagDef { id: 0x0102, name: "BitsPerSample" },
    TagDef { id: 0x0103, name: "Compression" },
    TagDef { id: 0x0106, name: "PhotometricInterpretation" },
    TagDef { id: 0x010E, name: "ImageDescription" },
    TagDef { id: 0x010F, name: "Make" },
    TagDef { id: 0x0110, name: "Model" },
    TagDef { id: 0x0111, name: "StripOffsets" },
    TagDef { id: 0x0112, name: "Orientation" },
    TagDef { id: 0x0115, name: "SamplesPerPixel" },
    TagDef { id: 0x0116, name: "RowsPerStrip" },
    TagDef { id: 0x0117, name: "StripByteCounts" },
    TagDef { id: 0x011A, name: "XResolution" },
    TagDef { id: 0x011B, name: "YResolution" },
    TagDef { id: 0x011C, name: "PlanarConfiguration" },
    TagDef { id: 0x0128, name: "ResolutionUnit" },
    TagDef { id: 0x012D, name: "TransferFunction" },
    TagDef { id: 0x0131, name: "Software" },
    TagDef { id: 0x0132, name: "DateTime" },
    TagDef { id: 0x013B, name: "Artist" },
    TagDef { id: 0x013E, name: "WhitePoint" },
    TagDef { id: 0x013F, name: "PrimaryChromaticities" },
    TagDef { id: 0x0201, name: "JPEGInterchangeFormat" },
    TagDef { id: 0x0202, name: "JPEGInterchangeFormatLength" },
    TagDef { id: 0x0211, name: "YCbCrCoefficients" },
    TagDef { id: 0x0212, name: "YCbCrSubSampling" },
    TagDef { id: 0x0213, name: "YCbCrPositioning" },
    TagDef { id: 0x0214, name: "ReferenceBlackWhite" },
    TagDef { id: 0x4746, name: "Rating" },
    TagDef { id: 0x8298, name: "Copyright" },
    TagDef { id: 0x829A, name: "ExposureTime" },
    TagDef { id: 0x829D, name: "FNumber" },
    TagDef { id: 0x8769, name: "ExifIFDPointer" },
    TagDef { id: 0x8822, name: "ExposureProgram" },
    TagDef { id: 0x8824, name: "SpectralSensitivity" },
    TagDef { id: 0x8825, name: "GPSInfoIFDPointer" },
    TagDef { id: 0x8827, name: "PhotographicSensitivity" },
    TagDef { id: 0x8828, name: "OECF" },
    TagDef { id: 0x8830, name: "SensitivityType" },
    TagDef { id: 0x8831, name: "StandardOutputSensitivity" },
    TagDef { id: 0x8832, name: "RecommendedExposureIndex" },
    TagDef { id: 0x8833, name: "ISOSpeed" },
    TagDef { id: 0x8834, name: "ISOSpeedLatitudeyyy" },
    TagDef { id: 0x8835, name: "ISOSpeedLatitudezzz" },
    TagDef { id: 0x9000, name: "ExifVersion" },
    TagDef { id: 0x9003, name: "DateTimeOriginal" },
    TagDef { id: 0x9004, name: "DateTimeDigitized" },
    TagDef { id: 0x9101, name: "ComponentsConfiguration" },
    TagDef { id: 0x9102, name: "CompressedBitsPerPixel" },
    TagDef { id: 0x9201, name: "ShutterSpeedValue" },
    TagDef { id: 0x9202, name: "ApertureValue" },
    TagDef { id: 0x9203, name: "BrightnessValue" },
    TagDef { id: 0x9204, name: "ExposureBiasValue" },
    TagDef { id: 0x9205, name: "MaxApertureValue" },
    TagDef { id: 0x9206, name: "SubjectDistance" },
    TagDef { id: 0x9207, name: "MeteringMode" },
    TagDef { id: 0x9208, name: "LightSource" },
    TagDef { id: 0x9209, name: "Flash" },
    TagDef { id: 0x920A, name: "FocalLength" },
    TagDef { id: 0x9214, name: "SubjectArea" },
    TagDef { id: 0x927C, name: "MakerNote" },
    TagDef { id: 0x9286, name: "UserComment" },
    TagDef { id: 0x9290, name: "SubSecTime" },
    TagDef { id: 0x9291, name: "SubSecTimeOriginal" },
    TagDef { id: 0x9292, name: "SubSecTimeDigitized" },
    TagDef { id: 0xA000, name: "FlashPixVersion" },
    TagDef { id: 0xA001, name: "ColorSpace" },
    TagDef { id: 0xA002, name: "PixelXDimension" },
    TagDef { id: 0xA003, name: "PixelYDimension" },
    TagDef { id: 0xA004, name: "RelatedSoundFile" },
    TagDef { id: 0xA005, name: "InteroperabilityIFDPointer" },
    TagDef { id: 0xA20B, name: "FlashEnergy" },
    TagDef { id: 0xA20C, name: "SpatialFrequencyResponse" },
    TagDef { id: 0xA20E, name: "FocalPlaneXResolution" },
    TagDef { id: 0xA20F, name: "FocalPlaneYResolution" },
    TagDef { id: 0xA210, name: "FocalPlaneResolutionUnit" },
    TagDef { id: 0xA214, name: "SubjectLocation" },
    TagDef { id: 0xA215, name: "ExposureIndex" },
    TagDef { id: 0xA217, name: "SensingMethod" },
    TagDef { id: 0xA300, name: "FileSource" },
    TagDef { id: 0xA301, name: "SceneType" },
    TagDef { id: 0xA302, name: "CFAPattern" },
    TagDef { id: 0xA401, name: "CustomRendered" },
    TagDef { id: 0xA402, name: "ExposureMode" },
    TagDef { id: 0xA403, name: "WhiteBalance" },
    TagDef { id: 0xA404, name: "DigitalZoomRatio" },
    TagDef { id: 0xA405, name: "FocalLengthIn35mmFormat" },
    TagDef { id: 0xA406, name: "SceneCaptureType" },
    TagDef { id: 0xA407, name: "GainControl" },
    TagDef { id: 0xA408, name: "Contrast" },
    TagDef { id: 0xA409, name: "Saturation" },
    TagDef { id: 0xA40A, name: "Sharpness" },
    TagDef { id: 0xA40B, name: "DeviceSettingDescription" },
    TagDef { id: 0xA40C, name: "SubjectDistanceRange" },
    TagDef { id: 0xA420, name: "ImageUniqueID" },
    TagDef { id: 0xA430, name: "CameraOwnerName" },
    TagDef { id: 0xA431, name: "BodySerialNumber" },
    TagDef { id: 0xA432, name: "LensSpecification" },
    TagDef { id: 0xA433, name: "LensMake" },
    TagDef { id: 0xA434, name: "LensModel" },
    TagDef { id: 0xA435, name: "LensSerialNumber" },
    TagDef { id: 0xA500, name: "Gamma" },
    TagDef { id: 0xC4A5, name: "PrintIM" },
    TagDef { id: 0xEA1C, name: "Padding" },
];

/// GPS IFD names
pub const GPS_TAGS: &[TagDef] = &[
    TagDef { id: 0x0000, name: "GPSVersionID" },
    TagDef { id: 0x0001, name: "GPSLatitudeRef" },
    TagDef { id: 0x0002, name: "GPSLatitude" },
    TagDef { id: 0x0003, name: "GPSLongitudeRef" },
    TagDef { id: 0x0004, name: "GPSLongitude" },
    TagDef { id: 0x0005, name: "GPSAltitudeRef" },
    TagDef { id: 0x0006, name: "GPSAltitude" },
    TagDef { id: 0x0007, name: "GPSTimeStamp" },
    TagDef { id: 0x0008, name: "GPSSatellites" },
    TagDef { id: 0x0009, name: "GPSStatus" },
    TagDef { id: 0x000A, name: "GPSMeasureMode" },
    TagDef { id: 0x000B, name: "GPSDOP" },
    TagDef { id: 0x000C, name: "GPSSpeedRef" },
    TagDef { id: 0x000D, name: "GPSSpeed" },
    TagDef { id: 0x000E, name: "GPSTrackRef" },
    TagDef { id: 0x000F, name: "GPSTrack" },
    TagDef { id: 0x0010, name: "GPSImgDirectionRef" },
    TagDef { id: 0x0011, name: "GPSImgDirection" },
    TagDef { id: 0x0012, name: "GPSMapDatum" },
    TagDef { id: 0x0013, name: "GPSDestLatitudeRef" },
    TagDef { id: 0x0014, name: "GPSDestLatitude" },
    TagDef { id: 0x0015, name: "GPSDestLongitudeRef" },
    TagDef { id: 0x0016, name: "GPSDestLongitude" },
    TagDef { id: 0x0017, name: "GPSBearingRef" },
    TagDef { id: 0x0018, name: "GPSBearing" },
    TagDef { id: 0x0019, name: "GPSDestDistanceRef" },
    TagDef { id: 0x001A, name: "GPSDestDistance" },
    TagDef { id: 0x001B, name: "GPSProcessingMethod" },
    TagDef { id: 0x001C, name: "GPSAreaInformation" },
    TagDef { id: 0x001D, name: "GPSDateStamp" },
    TagDef { id: 0x001E, name: "GPSDifferential" },
    TagDef { id: 0x001F, name: "GPSHPositioningError" },
];

/// Interoperability IFD names
pub const INTEROP_TAGS: &[TagDef] = &[
    TagDef { id: 0x0001, name: "InteroperabilityIndex" },
    TagDef { id: 0x0002, name: "InteroperabilityVersion" },
    TagDef { id: 0x1000, name: "RelatedImageFileFormat" },
    TagDef { id: 0x1001, name: "RelatedImageWidth" },
    TagDef { id: 0x1002, name: "RelatedImageHeight" },
];

/// Display name of a tag within its owning IFD namespace
pub fn tag_name(kind: IfdKind, id: u16) -> Option<&'static str> {
    let table = match kind {
        IfdKind::Zeroth | IfdKind::First | IfdKind::Exif => IMAGE_TAGS,
        IfdKind::Gps => GPS_TAGS,
        IfdKind::Interop => INTEROP_TAGS,
    };
    table.iter().find(|def| def.id == id).map(|def| def.name)
}
