//! Settings keys shared across device models.

pub const ALL_ON: &str = "allOn";
pub const ALL_OFF: &str = "allOff";
pub const RESTORE_STATUS: &str = "restoreStatus";
pub const AUTO_OFF: &str = "autoOff";
pub const AUTO_ON: &str = "autoOn";
pub const POWER_REPORTING_THRESHOLD: &str = "powerReportingThreshold";
pub const POWER_REPORTING_INTERVAL: &str = "powerReportingInterval";
pub const TEMPERATURE_SENSOR_OFFSET: &str = "temperatureSensorOffset";
pub const TEMPERATURE_SENSOR_REPORTING_THRESHOLD: &str = "temperatureSensorReportingThreshold";
pub const ENABLE_INPUT_1: &str = "enableInput1";
pub const ENABLE_INPUT_2: &str = "enableInput2";
pub const ENABLE_INPUT_3: &str = "enableInput3";
pub const MULTI_CHANNEL_REPORTING_CONFIGURED: &str = "multiChannelReportingConfigured";
pub const ZW_GROUP_1: &str = "zw_group_1";

pub const WORKING_MODE: &str = "workingMode";

pub const DIM_DURATION: &str = "dimDuration";
pub const MINIMUM_DIM_VALUE: &str = "minimumDimValue";
pub const MAXIMUM_DIM_VALUE: &str = "maximumDimValue";

pub const OPERATING_MODE: &str = "operatingMode";
pub const MOTOR_MOVING_TIME: &str = "motorMovingTime";
pub const SLATS_TILTING_TIME: &str = "slatsTiltingTime";
pub const POWER_REPORT_DELAY_TIME: &str = "powerReportDelayTime";
pub const DELAY_BETWEEN_MOTOR_MOVEMENT: &str = "delayBetweenMotorMovement";
pub const MOTOR_OPERATION_DETECTION: &str = "motorOperationDetection";
pub const INVERT_WINDOW_COVERINGS_DIRECTION: &str = "invertWindowCoveringsDirection";
pub const INVERT_WINDOW_COVERINGS_TILT_DIRECTION: &str = "invertWindowCoveringsTiltDirection";

pub const TEMPERATURE_HEATING_HYSTERESIS_ON: &str = "temperatureHeatingHysteresisOn";
pub const TEMPERATURE_HEATING_HYSTERESIS_OFF: &str = "temperatureHeatingHysteresisOff";
pub const TEMPERATURE_COOLING_HYSTERESIS_ON: &str = "temperatureCoolingHysteresisOn";
pub const TEMPERATURE_COOLING_HYSTERESIS_OFF: &str = "temperatureCoolingHysteresisOff";
pub const ANTIFREEZE: &str = "antifreeze";
pub const ANTIFREEZE_ENABLED: &str = "antifreezeEnabled";
pub const TOO_LOW_TEMPERATURE_LIMIT: &str = "tooLowTemperatureLimit";
pub const TOO_HIGH_TEMPERATURE_LIMIT: &str = "tooHighTemperatureLimit";
pub const RELAY_TYPE_Q1: &str = "relayTypeQ1";
pub const RELAY_TYPE_Q2: &str = "relayTypeQ2";
